// src/queue/mod.rs

//! In-process job queue.
//!
//! Jobs are pushed over a bounded mpsc channel to a fixed pool of worker
//! tasks. Each worker owns its own [`ProcessSupervisor`](crate::exec::ProcessSupervisor)
//! and runs one job at a time, so no supervisor is ever used for two
//! overlapping runs. Results are handed back through a oneshot per job and
//! are not persisted.

pub mod job;
pub mod worker;

pub use job::{Job, JobOutcome, JobTicket};
pub use worker::JobQueue;
