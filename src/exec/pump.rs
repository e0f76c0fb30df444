// src/exec/pump.rs

//! Draining one output stream to EOF.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::exec::buffer::OutputBuffer;
use crate::exec::callback::{Callback, CallbackMode};

const CHUNK_SIZE: usize = 8 * 1024;

/// Drains a single stream, appending every decoded chunk to an
/// [`OutputBuffer`] and handing it to an optional [`Callback`].
///
/// A pump is single-use: [`StreamPump::pump`] consumes it. Capture never
/// depends on the callback: the chunk is appended first, and callback errors
/// or panics are logged and dropped without stopping the drain.
#[derive(Debug)]
pub struct StreamPump {
    stream: &'static str,
    callback: Option<Callback>,
    buffer: Arc<OutputBuffer>,
}

impl StreamPump {
    pub fn new(stream: &'static str, callback: Option<Callback>, buffer: Arc<OutputBuffer>) -> Self {
        Self {
            stream,
            callback,
            buffer,
        }
    }

    /// Read `reader` until EOF. Returns the number of bytes read.
    ///
    /// A read error ends the pump the same way EOF does (it is logged).
    pub async fn pump<R>(self, mut reader: R) -> u64
    where
        R: AsyncRead + Unpin,
    {
        let mut decoder = Utf8Decoder::default();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    total += n as u64;
                    let text = decoder.decode(&buf[..n]);
                    self.deliver(text).await;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(stream = self.stream, error = %e, "read error; stopping pump");
                    break;
                }
            }
        }

        self.deliver(decoder.finish()).await;
        debug!(stream = self.stream, bytes = total, "stream closed");
        total
    }

    async fn deliver(&self, text: String) {
        if text.is_empty() {
            return;
        }

        self.buffer.append(&text);

        let Some(callback) = &self.callback else {
            return;
        };

        let outcome = match callback.mode() {
            CallbackMode::Inline => match catch_unwind(AssertUnwindSafe(|| callback.call(&text))) {
                Ok(res) => res,
                Err(payload) => Err(anyhow!("callback panicked: {}", panic_message(&*payload))),
            },
            CallbackMode::Blocking => {
                let handler = callback.handler();
                match tokio::task::spawn_blocking(move || handler(&text)).await {
                    Ok(res) => res,
                    Err(join_err) => Err(anyhow!("callback panicked: {join_err}")),
                }
            }
        };

        if let Err(e) = outcome {
            warn!(stream = self.stream, error = %e, "callback error; continuing");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across two reads is held back until the rest
/// arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is still pending at EOF.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}
