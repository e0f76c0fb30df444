// src/exec/termination.rs

//! Graceful-then-forced shutdown of one running process.
//!
//! State machine:
//!
//! ```text
//! Running ──terminate()──▶ Terminating ──grace elapsed──▶ Killed
//!    │                          │
//!    └──────── exit ────────────┴──────────▶ Exited
//! ```
//!
//! `Exited` and `Killed` are terminal. Exit is never observed here directly:
//! the supervisor's exit-wait activity owns the child and reports it through
//! [`TerminationController::observe_exit`].
//!
//! The SIGTERM → grace → SIGKILL sequence runs on its own task, started by the
//! first [`TerminationController::terminate`] call. Callers only wait for its
//! outcome, so dropping a `terminate()` future never stops the kill.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::errors::{Result, RunnerError};
use crate::exec::signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    Terminating,
    Killed,
    Exited,
}

impl TerminationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TerminationState::Killed | TerminationState::Exited)
    }
}

/// How an escalation ended.
#[derive(Debug, Clone, Copy)]
enum Escalation {
    Finished(TerminationState),
    KillFailed,
}

#[derive(Debug)]
struct Status {
    state: TerminationState,
    /// Set once, by the call that leaves `Running` through `terminate()`.
    escalation: Option<watch::Receiver<Option<Escalation>>>,
}

#[derive(Debug)]
struct Shared {
    pid: u32,
    status: Mutex<Status>,
    exited: watch::Sender<bool>,
}

#[derive(Debug)]
pub struct TerminationController {
    shared: Arc<Shared>,
}

impl TerminationController {
    pub fn new(pid: u32) -> Self {
        let (exited, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                pid,
                status: Mutex::new(Status {
                    state: TerminationState::Running,
                    escalation: None,
                }),
                exited,
            }),
        }
    }

    pub fn pid(&self) -> u32 {
        self.shared.pid
    }

    pub fn state(&self) -> TerminationState {
        self.shared.lock().state
    }

    /// Record that the process has exited.
    pub fn observe_exit(&self) {
        {
            let mut status = self.shared.lock();
            if matches!(
                status.state,
                TerminationState::Running | TerminationState::Terminating
            ) {
                status.state = TerminationState::Exited;
            }
        }
        self.shared.exited.send_replace(true);
    }

    /// Send the graceful signal, wait up to `grace` for exit, then force kill.
    ///
    /// The first call starts the escalation in the background; later calls
    /// join it and get the same outcome (their own durations are ignored).
    /// After the process exited without an escalation this returns `Exited`
    /// at once. Fails with [`RunnerError::TerminationFailed`] if the process
    /// is still not observed as exited `kill_wait` after the kill.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn terminate(&self, grace: Duration, kill_wait: Duration) -> Result<TerminationState> {
        let mut rx = {
            let mut status = self.shared.lock();
            if let Some(rx) = &status.escalation {
                debug!(pid = self.pid(), state = ?status.state, "joining termination in progress");
                rx.clone()
            } else if status.state == TerminationState::Running {
                status.state = TerminationState::Terminating;
                let (tx, rx) = watch::channel(None);
                status.escalation = Some(rx.clone());
                tokio::spawn(escalate(Arc::clone(&self.shared), grace, kill_wait, tx));
                rx
            } else {
                debug!(pid = self.pid(), state = ?status.state, "terminate requested; nothing to do");
                return Ok(status.state);
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => *outcome,
            Err(_) => None,
        };

        match outcome {
            Some(Escalation::Finished(state)) => Ok(state),
            Some(Escalation::KillFailed) => Err(RunnerError::TerminationFailed { pid: self.pid() }),
            // The escalation task went away with its runtime.
            None => Ok(self.state()),
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn wait_for_exit(&self, limit: Duration) -> bool {
        let mut rx = self.exited.subscribe();
        matches!(timeout(limit, rx.wait_for(|exited| *exited)).await, Ok(Ok(_)))
    }
}

async fn escalate(
    shared: Arc<Shared>,
    grace: Duration,
    kill_wait: Duration,
    tx: watch::Sender<Option<Escalation>>,
) {
    let outcome = run_escalation(&shared, grace, kill_wait).await;
    tx.send_replace(Some(outcome));
}

async fn run_escalation(shared: &Shared, grace: Duration, kill_wait: Duration) -> Escalation {
    let pid = shared.pid;

    debug!(pid, grace_secs = grace.as_secs_f64(), "terminating process gracefully");
    match signal::send_terminate(pid) {
        Ok(true) => {}
        Ok(false) => debug!(pid, "process group already gone before SIGTERM"),
        Err(e) => warn!(pid, error = %e, "failed to send graceful termination signal"),
    }

    if shared.wait_for_exit(grace).await {
        debug!(pid, "process terminated gracefully");
        return Escalation::Finished(shared.lock().state);
    }

    // No await between deciding to kill and sending the kill.
    {
        let mut status = shared.lock();
        if status.state == TerminationState::Exited {
            return Escalation::Finished(TerminationState::Exited);
        }
        status.state = TerminationState::Killed;

        warn!(
            pid,
            grace_secs = grace.as_secs_f64(),
            "graceful termination failed; force killing process"
        );
        match signal::send_kill(pid) {
            Ok(true) => {}
            Ok(false) => debug!(pid, "process group already gone before SIGKILL"),
            Err(e) => warn!(pid, error = %e, "failed to send kill signal"),
        }
    }

    if shared.wait_for_exit(kill_wait).await {
        Escalation::Finished(TerminationState::Killed)
    } else {
        error!(
            pid,
            wait_secs = kill_wait.as_secs_f64(),
            "process still alive after kill"
        );
        Escalation::KillFailed
    }
}
