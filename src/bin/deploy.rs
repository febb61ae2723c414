use std::process::ExitCode;

use anyhow::Result;

use fixtures_site::config::DeployConfig;
use fixtures_site::deploy::{DeployContext, Pipeline, SystemRunner};
use fixtures_site::logging;

fn main() -> Result<ExitCode> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_cli()?;

    let config = DeployConfig::from_env();
    let mut ctx = DeployContext::new(config, Box::new(SystemRunner));
    let report = Pipeline::standard().run(&mut ctx);

    println!("Deploy finished");
    for result in &report.results {
        println!(
            "  {:<9} {:<8} {}",
            result.name,
            result.outcome.label(),
            result.outcome.message()
        );
    }
    if report.exit_code != 0 {
        println!("Exit code: {}", report.exit_code);
    }
    Ok(ExitCode::from(u8::try_from(report.exit_code).unwrap_or(1)))
}
