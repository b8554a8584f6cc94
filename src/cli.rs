// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `backstop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backstop",
    version,
    about = "Run configured backup jobs in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Names of jobs to run (their prerequisites are included automatically).
    ///
    /// If neither jobs nor `--set` is given, all enabled jobs are run.
    #[arg(value_name = "JOB")]
    pub jobs: Vec<String>,

    /// Run the jobs of a named `[set.<name>]` from the config file.
    #[arg(long, value_name = "NAME", conflicts_with = "jobs")]
    pub set: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Backstop.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Backstop.toml")]
    pub config: String,

    /// Go through the motions without archiving, transferring or pruning.
    ///
    /// The dependency graph, execution plan and pre-execution checks run for
    /// real; every mutating operation is logged instead of performed.
    #[arg(long)]
    pub simulate: bool,

    /// Validate the config, print the execution plan, and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BACKSTOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
