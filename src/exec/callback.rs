// src/exec/callback.rs

//! Chunk callbacks invoked by the stream pumps.
//!
//! A callback is one uniform interface (`Fn(&str) -> anyhow::Result<()>`)
//! plus a [`CallbackMode`] declared by the caller:
//!
//! - [`CallbackMode::Inline`]: the handler is fast and non-blocking, so the
//!   pump calls it directly on its own task.
//! - [`CallbackMode::Blocking`]: the handler may block (file IO, locks,
//!   network), so the pump hands it to Tokio's blocking pool and awaits it.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

type Handler = dyn Fn(&str) -> Result<()> + Send + Sync;

/// How a pump should invoke a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackMode {
    #[default]
    Inline,
    Blocking,
}

/// A per-chunk handler for one output stream.
#[derive(Clone)]
pub struct Callback {
    handler: Arc<Handler>,
    mode: CallbackMode,
}

impl Callback {
    /// A fast, non-blocking handler invoked inline.
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(f),
            mode: CallbackMode::Inline,
        }
    }

    /// A handler that may block; invoked off the async worker threads.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(f),
            mode: CallbackMode::Blocking,
        }
    }

    /// Default callback: forward every chunk to the log at `info`.
    pub fn log(stream: &'static str) -> Self {
        Self::inline(move |chunk| {
            info!(stream, "{}", chunk.trim_end_matches('\n'));
            Ok(())
        })
    }

    pub fn mode(&self) -> CallbackMode {
        self.mode
    }

    pub(crate) fn handler(&self) -> Arc<Handler> {
        Arc::clone(&self.handler)
    }

    pub fn call(&self, chunk: &str) -> Result<()> {
        (self.handler)(chunk)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("mode", &self.mode).finish()
    }
}

/// Optional callbacks for both streams of one run.
#[derive(Debug, Clone, Default)]
pub struct Callbacks {
    pub stdout: Option<Callback>,
    pub stderr: Option<Callback>,
}

impl Callbacks {
    pub fn none() -> Self {
        Self::default()
    }

    /// Log both streams, as a queued job does.
    pub fn logging() -> Self {
        Self {
            stdout: Some(Callback::log("stdout")),
            stderr: Some(Callback::log("stderr")),
        }
    }

    pub fn with_stdout(mut self, cb: Callback) -> Self {
        self.stdout = Some(cb);
        self
    }

    pub fn with_stderr(mut self, cb: Callback) -> Self {
        self.stderr = Some(cb);
        self
    }
}
