// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::types::Environment;
use crate::exec::CommandSpec;

/// Settings as read from TOML, the environment, or a profile.
///
/// Every field is optional so layers can be merged before validation:
///
/// ```toml
/// debug = false
/// timeout_sec = 30
/// grace_period_sec = 10
/// temp_workdir = "scratch"
/// log_level = "info"
///
/// [queue]
/// workers = 4
/// capacity = 64
/// ```
///
/// Unknown keys are ignored so the file can be shared with other services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    /// Chosen by `PROCRUNNER_ENVIRONMENT`, never by the file.
    #[serde(skip)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub debug: Option<bool>,

    /// Wall-clock limit per command. `0` means no timeout.
    #[serde(default)]
    pub timeout_sec: Option<f64>,

    #[serde(default)]
    pub grace_period_sec: Option<f64>,

    #[serde(default)]
    pub kill_wait_sec: Option<f64>,

    /// Working directory for queued jobs that don't name one.
    #[serde(default)]
    pub temp_workdir: Option<PathBuf>,

    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub queue: RawQueueSection,
}

/// `[queue]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQueueSection {
    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default)]
    pub capacity: Option<usize>,
}

impl RawSettings {
    /// Profile defaults for `env`.
    pub fn profile(env: Environment) -> Self {
        let mut raw = RawSettings {
            environment: Some(env),
            ..Default::default()
        };
        match env {
            Environment::Development => {
                raw.debug = Some(true);
                raw.temp_workdir = Some(PathBuf::from("temp"));
            }
            Environment::Production | Environment::Test => {
                raw.debug = Some(false);
            }
        }
        raw
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: RawSettings) -> RawSettings {
        RawSettings {
            environment: other.environment.or(self.environment),
            debug: other.debug.or(self.debug),
            timeout_sec: other.timeout_sec.or(self.timeout_sec),
            grace_period_sec: other.grace_period_sec.or(self.grace_period_sec),
            kill_wait_sec: other.kill_wait_sec.or(self.kill_wait_sec),
            temp_workdir: other.temp_workdir.or(self.temp_workdir),
            log_level: other.log_level.or(self.log_level),
            queue: RawQueueSection {
                workers: other.queue.workers.or(self.queue.workers),
                capacity: other.queue.capacity.or(self.queue.capacity),
            },
        }
    }
}

/// Validated settings, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub environment: Environment,
    pub debug: bool,
    pub timeout: Option<Duration>,
    pub grace_period: Duration,
    pub kill_wait: Duration,
    pub temp_workdir: Option<PathBuf>,
    pub log_level: Option<tracing::Level>,
    pub queue: QueueSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub workers: usize,
    pub capacity: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            capacity: 64,
        }
    }
}

impl Settings {
    /// A [`CommandSpec`] for `argv` carrying this configuration's timeouts.
    pub fn command<I, S>(&self, argv: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(argv)
            .timeout(self.timeout)
            .grace_period(self.grace_period)
            .kill_wait(self.kill_wait)
    }
}
