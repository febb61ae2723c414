use std::io;

use anyhow::{Context, Result};
use log::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LEVEL_VAR: &str = "LOG_LEVEL";

pub fn level_from_env() -> LevelFilter {
    parse_level(std::env::var(LEVEL_VAR).ok().as_deref())
}

/// Unset or unparseable means `Info`.
pub fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Terminal board: records are captured in memory for the log pane, so the
/// alternate screen is never written to.
pub fn init_tui(level: LevelFilter) -> Result<()> {
    tui_logger::init_logger(level).context("install tui logger")?;
    tui_logger::set_default_level(level);
    Ok(())
}

/// Command-line tools: `log` records are bridged into a stderr fmt subscriber.
pub fn init_cli() -> Result<()> {
    let filter = EnvFilter::try_from_env(LEVEL_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}
