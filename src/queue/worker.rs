// src/queue/worker.rs

//! Worker pool behind [`JobQueue`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::errors::{Result, RunnerError};
use crate::exec::{Callbacks, ProcessSupervisor};
use crate::queue::job::{Job, JobOutcome, JobTicket};

struct QueuedJob {
    id: u64,
    job: Job,
    reply: oneshot::Sender<JobOutcome>,
}

/// A bounded job queue served by `settings.queue.workers` worker tasks.
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    next_id: AtomicU64,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Spawn the worker pool. Must be called from within a Tokio runtime.
    pub fn start(settings: &Settings) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedJob>(settings.queue.capacity);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..settings.queue.workers)
            .map(|idx| {
                let rx = Arc::clone(&rx);
                let settings = settings.clone();
                tokio::spawn(worker_loop(idx, rx, settings))
            })
            .collect();

        Self {
            tx,
            next_id: AtomicU64::new(1),
            workers,
        }
    }

    /// Submit a job. Waits while the queue is full.
    pub async fn enqueue(&self, job: Job) -> Result<JobTicket> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(QueuedJob { id, job, reply })
            .await
            .map_err(|_| RunnerError::QueueClosed)?;

        debug!(job = id, "job enqueued");
        Ok(JobTicket { id, rx })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting jobs, let the workers finish what is queued, and join
    /// them.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "queue worker ended abnormally");
            }
        }
    }
}

async fn worker_loop(idx: usize, rx: Arc<Mutex<mpsc::Receiver<QueuedJob>>>, settings: Settings) {
    info!(worker = idx, "queue worker started");

    // One supervisor per worker: runs on it never overlap.
    let supervisor = ProcessSupervisor::new();

    loop {
        let next = rx.lock().await.recv().await;
        let Some(QueuedJob { id, job, reply }) = next else {
            break;
        };

        let outcome = run_job(&supervisor, &settings, id, job).await;
        if reply.send(outcome).is_err() {
            debug!(job = id, "submitter went away; dropping result");
        }
    }

    info!(worker = idx, "queue worker finished (channel closed)");
}

async fn run_job(supervisor: &ProcessSupervisor, settings: &Settings, id: u64, job: Job) -> JobOutcome {
    let cwd = match resolve_cwd(settings, &job) {
        Ok(cwd) => cwd,
        Err(e) => {
            warn!(job = id, error = %e, "could not prepare working directory");
            return JobOutcome {
                id,
                result: Err(e.to_string()),
            };
        }
    };

    let mut spec = settings.command(job.argv).cwd(cwd);
    if job.timeout.is_some() {
        spec = spec.timeout(job.timeout);
    }

    info!(job = id, cmd = ?spec.argv, "running job");
    let result = supervisor
        .run(&spec, &Callbacks::logging())
        .await
        .map_err(|e| {
            warn!(job = id, error = %e, "job failed");
            e.to_string()
        });

    JobOutcome { id, result }
}

fn resolve_cwd(settings: &Settings, job: &Job) -> Result<PathBuf> {
    if let Some(cwd) = &job.cwd {
        return Ok(cwd.clone());
    }
    match &settings.temp_workdir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.clone())
        }
        None => Ok(PathBuf::from(".")),
    }
}
