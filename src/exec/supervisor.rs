// src/exec/supervisor.rs

//! Running one command to completion.
//!
//! A run fans out into three activities on the caller's task, joined with
//! `try_join!`:
//!
//! 1. exit-wait: `child.wait()`, the only activity the deadline applies to;
//! 2. stdout pump;
//! 3. stderr pump.
//!
//! When the deadline fires the exit-wait does not give up on the child. It
//! drives the [`TerminationController`] while continuing to poll the same
//! `wait()` future, so the graceful or forced exit is still observed. The
//! pumps are never cancelled: killing the process closes its pipes and they
//! finish at EOF with everything the process wrote.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{Result, RunnerError};
use crate::exec::buffer::OutputBuffer;
use crate::exec::callback::Callbacks;
use crate::exec::command::{CommandSpec, RunResult};
use crate::exec::pump::StreamPump;
#[cfg(unix)]
use crate::exec::signal;
use crate::exec::termination::{TerminationController, TerminationState};

/// How the exit-wait activity ended.
enum Exit {
    Finished(Option<i32>),
    TimedOut(TerminationState),
}

#[derive(Clone)]
struct ActiveProcess {
    controller: Arc<TerminationController>,
    grace_period: Duration,
    kill_wait: Duration,
}

/// Spawns and supervises one OS process at a time.
///
/// Output buffers live on the supervisor and are reset at the start of every
/// [`run`](Self::run), so a single instance can be reused for sequential
/// runs. It must not be used for overlapping runs: two concurrent `run` calls
/// on one instance would share buffers and the active-process slot. Use one
/// supervisor per in-flight process instead.
#[derive(Default)]
pub struct ProcessSupervisor {
    stdout: Arc<OutputBuffer>,
    stderr: Arc<OutputBuffer>,
    active: Mutex<Option<ActiveProcess>>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `spec` and capture its output.
    ///
    /// Fails with [`RunnerError::Spawn`] if the process cannot be created,
    /// and with [`RunnerError::Timeout`] (carrying the partial output) if it
    /// outlives `spec.timeout`. The process is never left running when this
    /// returns.
    pub async fn run(&self, spec: &CommandSpec, callbacks: &Callbacks) -> Result<RunResult> {
        debug!(
            cmd = ?spec.argv,
            cwd = %spec.cwd.display(),
            timeout = ?spec.timeout,
            "starting process"
        );

        self.clear_history();
        let started = Instant::now();

        let mut child = spawn(spec)?;
        // `id()` is only `None` once the child has been reaped.
        let pid = child.id().unwrap_or_default();
        let controller = Arc::new(TerminationController::new(pid));
        self.set_active(Some(ActiveProcess {
            controller: Arc::clone(&controller),
            grace_period: spec.grace_period,
            kill_wait: spec.kill_wait,
        }));

        let stdout_pump = StreamPump::new("stdout", callbacks.stdout.clone(), Arc::clone(&self.stdout));
        let stderr_pump = StreamPump::new("stderr", callbacks.stderr.clone(), Arc::clone(&self.stderr));
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let joined = tokio::try_join!(
            wait_for_exit(&mut child, &controller, spec),
            drain(stdout_pump, stdout),
            drain(stderr_pump, stderr),
        );
        self.set_active(None);

        let (exit, stdout_bytes, stderr_bytes) = joined?;
        let duration = started.elapsed();

        match exit {
            Exit::Finished(exit_code) => {
                debug!(
                    pid,
                    exit_code = ?exit_code,
                    stdout_bytes,
                    stderr_bytes,
                    elapsed_ms = duration.as_millis() as u64,
                    "process completed"
                );
                Ok(RunResult {
                    exit_code,
                    stdout: self.stdout(),
                    stderr: self.stderr(),
                    duration,
                })
            }
            Exit::TimedOut(termination) => {
                let timeout = spec.timeout.unwrap_or_default();
                error!(
                    pid,
                    timeout_secs = timeout.as_secs_f64(),
                    termination = ?termination,
                    "process timed out"
                );
                Err(RunnerError::Timeout {
                    timeout,
                    termination,
                    stdout: self.stdout(),
                    stderr: self.stderr(),
                })
            }
        }
    }

    /// Blocking wrapper around [`run`](Self::run).
    ///
    /// Builds a current-thread runtime, so it must not be called from inside
    /// an async context.
    pub fn run_sync(&self, spec: &CommandSpec, callbacks: &Callbacks) -> Result<RunResult> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.run(spec, callbacks))
    }

    /// Gracefully terminate the active process, force killing it after the
    /// run's grace period. No-op when nothing is running.
    pub async fn terminate(&self) -> Result<()> {
        let active = self.lock_active().clone();
        let Some(active) = active else {
            debug!("terminate requested but no process is running");
            return Ok(());
        };
        active
            .controller
            .terminate(active.grace_period, active.kill_wait)
            .await
            .map(|_| ())
    }

    pub fn is_running(&self) -> bool {
        self.lock_active().is_some()
    }

    /// Pid of the active process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.lock_active().as_ref().map(|a| a.controller.pid())
    }

    pub fn clear_history(&self) {
        self.stdout.clear();
        self.stderr.clear();
    }

    pub fn stdout(&self) -> String {
        self.stdout.snapshot()
    }

    pub fn stderr(&self) -> String {
        self.stderr.snapshot()
    }

    fn set_active(&self, active: Option<ActiveProcess>) {
        *self.lock_active() = active;
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveProcess>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn spawn(spec: &CommandSpec) -> Result<Child> {
    let Some((program, args)) = spec.argv.split_first() else {
        return Err(RunnerError::InvalidCommand("empty argv".to_string()));
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd_or_dot(&spec.cwd))
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: program.clone(),
        source,
    })
}

fn cwd_or_dot(cwd: &Path) -> &Path {
    if cwd.as_os_str().is_empty() {
        Path::new(".")
    } else {
        cwd
    }
}

async fn drain<R>(pump: StreamPump, reader: Option<R>) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    Ok(match reader {
        Some(reader) => pump.pump(reader).await,
        None => 0,
    })
}

async fn wait_for_exit(
    child: &mut Child,
    controller: &TerminationController,
    spec: &CommandSpec,
) -> Result<Exit> {
    let wait = async {
        let status = child.wait().await;
        controller.observe_exit();
        status
    };
    tokio::pin!(wait);

    let Some(limit) = spec.timeout else {
        let status = wait.await.map_err(RunnerError::Wait)?;
        return Ok(Exit::Finished(status.code()));
    };

    tokio::select! {
        // Exit wins a tie with the deadline.
        biased;
        status = &mut wait => {
            let status = status.map_err(RunnerError::Wait)?;
            return Ok(Exit::Finished(status.code()));
        }
        _ = sleep(limit) => {}
    }

    warn!(
        pid = controller.pid(),
        timeout_secs = limit.as_secs_f64(),
        "process timeout reached; terminating process"
    );

    let terminate = controller.terminate(spec.grace_period, spec.kill_wait);
    tokio::pin!(terminate);
    let mut terminate_done = false;

    loop {
        tokio::select! {
            status = &mut wait => {
                status.map_err(RunnerError::Wait)?;
                break;
            }
            res = &mut terminate, if !terminate_done => {
                terminate_done = true;
                res?;
            }
        }
    }

    // The leader is gone, but other members of its group may still hold the
    // pipes open and keep the pumps from reaching EOF.
    #[cfg(unix)]
    match signal::send_kill(controller.pid()) {
        Ok(true) => debug!(pid = controller.pid(), "killed leftover process group members"),
        Ok(false) => {}
        Err(e) => warn!(pid = controller.pid(), error = %e, "failed to kill leftover process group"),
    }

    Ok(Exit::TimedOut(controller.state()))
}
