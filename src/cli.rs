// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `fixture-cache`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fixture-cache",
    version,
    about = "Push test map data through extract/contract, reusing cached results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Map data to process.
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Specification document owning the scenario. Enables the
    /// per-scenario cache directory.
    #[arg(long, value_name = "FILE")]
    pub feature: Option<PathBuf>,

    /// Scenario title (used with `--feature`).
    #[arg(long, value_name = "TITLE", default_value = "scenario")]
    pub scenario: String,

    /// Line of the scenario in the specification document.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub line: u32,

    /// Override the profile from the config.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Rerun every stage even if cached outputs exist.
    #[arg(long)]
    pub force: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FIXTURE_CACHE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print fingerprints and derived paths, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
