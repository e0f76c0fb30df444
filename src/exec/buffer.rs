// src/exec/buffer.rs

//! Per-stream output accumulation.

use std::sync::{Mutex, MutexGuard};

/// Ordered text accumulation for one output stream.
///
/// Chunks are appended in the order they were read and never reordered.
/// `snapshot` may be called at any time, including while a run is still in
/// progress. `clear` is meant to be called between runs: clearing while a
/// pump is still appending gives no ordering guarantee about which chunks
/// survive.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    text: Mutex<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, chunk: &str) {
        self.lock().push_str(chunk);
    }

    /// Full text accumulated so far.
    pub fn snapshot(&self) -> String {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Callbacks never run under this lock; a poisoned guard still holds valid text.
    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
