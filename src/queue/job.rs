// src/queue/job.rs

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::exec::RunResult;

/// A command submitted to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub argv: Vec<String>,
    /// Falls back to the configured `temp_workdir`, then the current directory.
    pub cwd: Option<PathBuf>,
    /// Falls back to the configured timeout.
    pub timeout: Option<Duration>,
}

impl Job {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            timeout: None,
        }
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What a worker reports back for one job.
///
/// Failures are flattened to their message, the way a result store would
/// hold them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub id: u64,
    pub result: Result<RunResult, String>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Handle returned by [`JobQueue::enqueue`](crate::queue::JobQueue::enqueue).
#[derive(Debug)]
pub struct JobTicket {
    pub(crate) id: u64,
    pub(crate) rx: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the job to finish.
    ///
    /// If the worker went away without reporting, the outcome is an error.
    pub async fn wait(self) -> JobOutcome {
        let id = self.id;
        self.rx.await.unwrap_or_else(|_| JobOutcome {
            id,
            result: Err("worker dropped the job without a result".to_string()),
        })
    }

    /// Like [`wait`](Self::wait), giving up after `limit`.
    pub async fn wait_timeout(self, limit: Duration) -> Option<JobOutcome> {
        timeout(limit, self.wait()).await.ok()
    }
}
