#![allow(dead_code)]

use std::time::Duration;

use procrunner::config::{Environment, RawSettings, Settings};
use procrunner::exec::CommandSpec;

/// `sh -c <script>` with no timeout.
pub fn sh(script: &str) -> CommandSpec {
    CommandSpec::new(["sh", "-c", script])
}

/// `sh -c <script>` with a timeout and grace period, both in milliseconds.
pub fn sh_with_timeout(script: &str, timeout_ms: u64, grace_ms: u64) -> CommandSpec {
    sh(script)
        .timeout(Some(Duration::from_millis(timeout_ms)))
        .grace_period(Duration::from_millis(grace_ms))
}

/// Builder for `Settings` starting from the TEST profile.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawSettings::profile(Environment::Test),
        }
    }

    pub fn timeout_sec(mut self, secs: f64) -> Self {
        self.raw.timeout_sec = Some(secs);
        self
    }

    pub fn grace_period_sec(mut self, secs: f64) -> Self {
        self.raw.grace_period_sec = Some(secs);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.raw.queue.workers = Some(workers);
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.raw.queue.capacity = Some(capacity);
        self
    }

    pub fn temp_workdir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.raw.temp_workdir = Some(dir.into());
        self
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
