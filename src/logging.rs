// src/logging.rs

//! Logging setup for `cachedag` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag, applied to `cachedag` targets only
//! 2. `CACHEDAG_LOG` environment variable: a bare level ("debug") is scoped
//!    to `cachedag`, anything else is read as env-filter directives
//!    (e.g. "cachedag::optimize=trace,tokio=debug")
//! 3. default to `info` for `cachedag` and `warn` for everything else
//!
//! Logs are sent to STDERR so that the printed plan on stdout stays clean.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const LOG_ENV: &str = "CACHEDAG_LOG";
const DEFAULT_DIRECTIVES: &str = "warn,cachedag=info";

/// Initialise the global logging subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());

    fmt()
        .with_env_filter(EnvFilter::try_new(&directives)?)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn scoped(level: &str) -> String {
    format!("warn,cachedag={level}")
}

fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return scoped(level.as_str());
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) if s.parse::<tracing::Level>().is_ok() => scoped(&s.to_lowercase()),
        Some(s) if EnvFilter::try_new(s).is_ok() => s.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}
