// src/bench.rs

//! Queue throughput benchmark.
//!
//! Enqueues `num_tasks` copies of a short command, then waits for every
//! ticket (each bounded by `result_timeout`) and reports how long both
//! phases took.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::Result;
use crate::queue::{Job, JobQueue};

#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub num_tasks: usize,
    pub command: Vec<String>,
    pub result_timeout: Duration,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            num_tasks: 100,
            command: vec!["sleep".to_string(), "0.1".to_string()],
            result_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub enqueued: usize,
    pub completed: usize,
    pub enqueue_time: Duration,
    pub process_time: Duration,
}

impl BenchReport {
    pub fn total_time(&self) -> Duration {
        self.enqueue_time + self.process_time
    }

    /// Jobs per second over the whole benchmark.
    pub fn throughput(&self) -> f64 {
        let secs = self.total_time().as_secs_f64();
        if secs > 0.0 {
            self.enqueued as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Enqueued in {:.2}s", self.enqueue_time.as_secs_f64())?;
        writeln!(
            f,
            "{}/{} tasks completed in {:.2}s",
            self.completed,
            self.enqueued,
            self.process_time.as_secs_f64()
        )?;
        writeln!(f, "Total time: {:.2}s", self.total_time().as_secs_f64())?;
        write!(f, "Throughput: {:.2} tasks/sec", self.throughput())
    }
}

/// Run the benchmark against `queue`.
///
/// A job counts as completed when it produced a result (any exit code)
/// within `result_timeout`.
pub async fn run_bench(queue: &JobQueue, opts: &BenchOptions) -> Result<BenchReport> {
    info!(num_tasks = opts.num_tasks, cmd = ?opts.command, "enqueuing benchmark jobs");

    let t0 = Instant::now();
    let mut tickets = Vec::with_capacity(opts.num_tasks);
    for _ in 0..opts.num_tasks {
        tickets.push(queue.enqueue(Job::new(opts.command.clone())).await?);
    }
    let enqueue_time = t0.elapsed();

    info!("waiting for all benchmark jobs to complete");
    let t1 = Instant::now();
    let mut completed = 0;
    for ticket in tickets {
        let id = ticket.id();
        match ticket.wait_timeout(opts.result_timeout).await {
            Some(outcome) if outcome.is_ok() => completed += 1,
            Some(outcome) => debug!(job = id, error = ?outcome.result.err(), "benchmark job failed"),
            None => debug!(job = id, "benchmark job timed out waiting for result"),
        }
    }
    let process_time = t1.elapsed();

    Ok(BenchReport {
        enqueued: opts.num_tasks,
        completed,
        enqueue_time,
        process_time,
    })
}
