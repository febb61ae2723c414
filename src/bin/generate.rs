use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use fixtures_site::config::SiteConfig;
use fixtures_site::db_reader;
use fixtures_site::logging;
use fixtures_site::site_builder::SiteBuilder;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_cli()?;

    let mut config = SiteConfig::from_env();
    if let Some(db) = parse_path_arg("db") {
        config.db_candidates = vec![db];
    }
    if let Some(out) = parse_path_arg("out") {
        config.output_dir = out;
    }
    if let Some(days) = parse_arg("days").and_then(|d| d.parse::<u32>().ok()) {
        config.days_ahead = days.clamp(1, 30);
    }

    let db_path = db_reader::find_db_path(&config.db_candidates)?;
    let conn = db_reader::open_db(&db_path)?;
    let targets = config
        .target_league_ids
        .iter()
        .copied()
        .collect::<HashSet<_>>();
    let fixtures = db_reader::get_fixtures(
        &conn,
        Utc::now().date_naive(),
        config.days_ahead,
        &targets,
    )
    .context("read fixtures")?;

    let builder = SiteBuilder::new(&config.output_dir)?;
    let site = builder.generate_all(&fixtures, config.days_ahead)?;

    println!("Site generation complete");
    println!("Fixtures: {}", fixtures.len());
    println!("Index: {}", site.index.display());
    println!("League pages: {}", site.league_pages.len());
    println!("JSON API: {}", site.json_api.fixtures.display());
    println!("  {}", site.json_api.leagues.display());
    println!("  {}", site.json_api.dates.display());
    println!("  {}", site.json_api.stats.display());
    println!("CSS: {}", site.css.display());
    println!("JS: {}", site.js.display());
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_arg(name).map(PathBuf::from)
}

/// `--name=value` or `--name value`; blank values are ignored.
fn parse_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
