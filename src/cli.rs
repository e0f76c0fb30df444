// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `procrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procrunner",
    version,
    about = "Run commands with streamed output, timeouts and graceful termination.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (TOML).
    ///
    /// Default: `procrunner.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCRUNNER_LOG`, the settings file, or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run one command and stream its output.
    Run(RunArgs),
    /// Measure job queue throughput.
    Bench(BenchArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Working directory for the command.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub cwd: PathBuf,

    /// Timeout in seconds (overrides settings; 0 disables).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Seconds to wait after SIGTERM before SIGKILL.
    #[arg(long, value_name = "SECS")]
    pub grace_period: Option<f64>,

    /// Command and arguments, e.g. `-- sleep 5`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct BenchArgs {
    /// Number of tasks to enqueue.
    #[arg(long, default_value_t = 100)]
    pub num_tasks: usize,

    /// Worker count (overrides settings).
    #[arg(long)]
    pub workers: Option<usize>,
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
