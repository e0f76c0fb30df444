// src/exec/mod.rs

//! Process execution core.
//!
//! - [`supervisor`] spawns a command and coordinates exit-wait, both stream
//!   pumps and the timeout.
//! - [`pump`] drains one output stream to EOF through a callback.
//! - [`termination`] owns the graceful-then-forced shutdown state machine.
//! - [`signal`] holds the platform termination primitives.
//! - [`buffer`], [`callback`] and [`command`] are the data types shared by
//!   the above.

pub mod buffer;
pub mod callback;
pub mod command;
pub mod pump;
pub mod signal;
pub mod supervisor;
pub mod termination;

pub use buffer::OutputBuffer;
pub use callback::{Callback, CallbackMode, Callbacks};
pub use command::{CommandSpec, DEFAULT_GRACE_PERIOD, DEFAULT_KILL_WAIT, RunResult};
pub use pump::{StreamPump, Utf8Decoder};
pub use supervisor::ProcessSupervisor;
pub use termination::{TerminationController, TerminationState};
