// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::time::Duration;

use thiserror::Error;

use crate::exec::TerminationState;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its deadline. Whatever output was captured before
    /// termination is carried along.
    #[error("Process timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        timeout: Duration,
        termination: TerminationState,
        stdout: String,
        stderr: String,
    },

    /// The process survived both SIGTERM and SIGKILL.
    #[error("Process {pid} did not exit after being killed")]
    TerminationFailed { pid: u32 },

    #[error("Failed waiting for process exit: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Job queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
