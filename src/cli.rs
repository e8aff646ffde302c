// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Strategy, budget and seed flags override the `[plan]` section of the
//! plan file for a single run without editing it.

use clap::{Parser, ValueEnum};

use crate::config::PlanOverrides;
use crate::types::{CacheStrategy, OrderStrategy};

/// Command-line arguments for `cachedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cachedag",
    version,
    about = "Choose which task results to keep in memory and in what order to run a DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the plan file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Cachedag.toml")]
    pub config: String,

    /// Logging level for cachedag (error, warn, info, debug, trace).
    ///
    /// If omitted, `CACHEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Cache strategy (all, none, greedy, random, heuristic, mkp).
    #[arg(long, value_name = "STRATEGY")]
    pub cache_strategy: Option<CacheStrategy>,

    /// Order strategy (none, ma-dfs, simulated-annealing, separator).
    #[arg(long, value_name = "STRATEGY")]
    pub order_strategy: Option<OrderStrategy>,

    /// Memory budget in bytes.
    #[arg(long, value_name = "BYTES")]
    pub memory_limit: Option<u64>,

    /// Seed for the random cache strategy and simulated annealing.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Parse + validate, print the DAG, but don't optimize.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Flags that replace values from the plan file's `[plan]` section.
    pub fn overrides(&self) -> PlanOverrides {
        PlanOverrides {
            cache_strategy: self.cache_strategy,
            order_strategy: self.order_strategy,
            memory_limit: self.memory_limit,
            seed: self.seed,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
