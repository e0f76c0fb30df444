// src/lib.rs

pub mod bench;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod queue;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::bench::{BenchOptions, run_bench};
use crate::cli::{BenchArgs, CliArgs, CliCommand, RunArgs};
use crate::config::Settings;
use crate::errors::RunnerError;
use crate::exec::{Callback, Callbacks, ProcessSupervisor};
use crate::queue::JobQueue;

/// High-level entry point used by `main.rs`.
///
/// Returns the exit code the binary should exit with.
pub async fn run(args: CliArgs, settings: &Settings) -> Result<i32> {
    info!(environment = %settings.environment, debug = settings.debug, "settings loaded");

    match args.command {
        CliCommand::Run(run_args) => run_command(run_args, settings).await,
        CliCommand::Bench(bench_args) => run_benchmark(bench_args, settings).await,
    }
}

async fn run_command(args: RunArgs, settings: &Settings) -> Result<i32> {
    let mut spec = settings.command(args.argv).cwd(args.cwd);
    if let Some(secs) = args.timeout {
        spec = spec.timeout(if secs == 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(secs)?)
        });
    }
    if let Some(secs) = args.grace_period {
        spec = spec.grace_period(Duration::try_from_secs_f64(secs)?);
    }

    let callbacks = Callbacks::none()
        .with_stdout(prefixed_printer("stdout"))
        .with_stderr(prefixed_printer("stderr"));

    let supervisor = Arc::new(ProcessSupervisor::new());

    // Ctrl-C → graceful termination of the running command.
    {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("interrupt received; terminating process");
            if let Err(e) = supervisor.terminate().await {
                warn!(error = %e, "termination after interrupt failed");
            }
        });
    }

    match supervisor.run(&spec, &callbacks).await {
        Ok(result) => {
            eprintln!("Return code: {:?}", result.exit_code);
            eprintln!("STDOUT size: {}", result.stdout.len());
            eprintln!("STDERR size: {}", result.stderr.len());
            Ok(result.exit_code.unwrap_or(1))
        }
        Err(err @ RunnerError::Timeout { .. }) => {
            eprintln!("Timeout error: {err}");
            Ok(1)
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_benchmark(args: BenchArgs, settings: &Settings) -> Result<i32> {
    let mut settings = settings.clone();
    if let Some(workers) = args.workers {
        if workers == 0 {
            bail!("--workers must be >= 1");
        }
        settings.queue.workers = workers;
    }

    let queue = JobQueue::start(&settings);
    println!("Enqueuing {} tasks on {} workers...", args.num_tasks, queue.worker_count());

    let opts = BenchOptions {
        num_tasks: args.num_tasks,
        ..Default::default()
    };
    let report = run_bench(&queue, &opts).await?;
    queue.shutdown().await;

    println!("{report}");
    Ok(if report.completed == report.enqueued { 0 } else { 1 })
}

/// Echo chunks to our own stdout as `<stream> | <text>`.
fn prefixed_printer(stream: &'static str) -> Callback {
    Callback::blocking(move |chunk| {
        let mut out = std::io::stdout().lock();
        for line in chunk.split_inclusive('\n') {
            write!(out, "{stream} | {line}")?;
        }
        out.flush()?;
        Ok(())
    })
}
