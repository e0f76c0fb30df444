use std::sync::{Arc, Mutex};

use anyhow::bail;
use procrunner::exec::{Callback, CallbackMode};

/// Records every chunk it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingCallback {
    chunks: Arc<Mutex<Vec<String>>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self, mode: CallbackMode) -> Callback {
        let chunks = Arc::clone(&self.chunks);
        let record = move |chunk: &str| -> anyhow::Result<()> {
            chunks.lock().unwrap().push(chunk.to_string());
            Ok(())
        };
        match mode {
            CallbackMode::Inline => Callback::inline(record),
            CallbackMode::Blocking => Callback::blocking(record),
        }
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().unwrap().clone()
    }

    /// All recorded chunks concatenated in order.
    pub fn text(&self) -> String {
        self.chunks.lock().unwrap().concat()
    }

    pub fn count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }
}

/// A callback that returns an error for every chunk.
pub fn failing_callback(mode: CallbackMode) -> Callback {
    let fail = |chunk: &str| -> anyhow::Result<()> { bail!("refusing chunk of {} bytes", chunk.len()) };
    match mode {
        CallbackMode::Inline => Callback::inline(fail),
        CallbackMode::Blocking => Callback::blocking(fail),
    }
}

/// A callback that panics on every chunk.
pub fn panicking_callback(mode: CallbackMode) -> Callback {
    let boom = |_: &str| -> anyhow::Result<()> { panic!("callback exploded") };
    match mode {
        CallbackMode::Inline => Callback::inline(boom),
        CallbackMode::Blocking => Callback::blocking(boom),
    }
}
