// src/exec/command.rs

//! Per-run command description and result.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default wait between the graceful signal and the forced kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// How long to wait for a forced kill to take effect before giving up.
pub const DEFAULT_KILL_WAIT: Duration = Duration::from_secs(5);

/// Everything needed to run one command.
///
/// Built once per run and not modified while the run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program followed by its arguments. Must not be empty.
    pub argv: Vec<String>,
    /// Working directory of the child.
    pub cwd: PathBuf,
    /// Variables added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Wall-clock limit for the process (None = no timeout).
    pub timeout: Option<Duration>,
    pub grace_period: Duration,
    pub kill_wait: Duration,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: PathBuf::from("."),
            env: BTreeMap::new(),
            timeout: None,
            grace_period: DEFAULT_GRACE_PERIOD,
            kill_wait: DEFAULT_KILL_WAIT,
        }
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = dir.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn kill_wait(mut self, wait: Duration) -> Self {
        self.kill_wait = wait;
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Outcome of a run that finished before its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Exit code; `None` if the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
