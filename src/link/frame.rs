//! Frame reassembly and readiness synchronization.
//!
//! The device interleaves diagnostic output with image data, so both readers
//! discard anything they are not looking for. Both are bounded by a budget of
//! consecutive idle reads (reads that hit the transport timeout) and poll the
//! abort flag between reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::protocol::{is_sentinel, END_MARK, READY_MARK, START_MARK};
use super::transport::Transport;
use crate::error::LinkError;

/// One base64 image payload collected between START and END markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Concatenated payload lines, in arrival order.
    pub payload: String,
    /// Number of payload lines received.
    pub chunks: usize,
}

/// Reads the next line, giving up after `limit` consecutive timeouts.
fn next_line<T: Transport + ?Sized>(
    transport: &mut T,
    abort: &AtomicBool,
    limit: u32,
    waiting_for: &'static str,
) -> Result<String, LinkError> {
    let mut idle = 0;
    loop {
        if abort.load(Ordering::SeqCst) {
            return Err(LinkError::Interrupted);
        }

        match transport.read_line()? {
            Some(line) => return Ok(line),
            None => {
                idle += 1;
                if idle >= limit {
                    return Err(LinkError::Timeout {
                        waiting_for,
                        idle_reads: idle,
                    });
                }
            }
        }
    }
}

/// Reassembles one image payload per call.
#[derive(Debug, Clone)]
pub struct FrameReader {
    max_idle_reads: u32,
    abort: Arc<AtomicBool>,
}

impl FrameReader {
    pub fn new(max_idle_reads: u32, abort: Arc<AtomicBool>) -> Self {
        Self {
            max_idle_reads: max_idle_reads.max(1),
            abort,
        }
    }

    /// Reads lines until a complete START..END span has been seen.
    ///
    /// A second START restarts the payload. An END without a preceding START
    /// is noise. `READY` lines inside a span are skipped since the device may
    /// print it at any time.
    pub fn read_frame<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Frame, LinkError> {
        let mut chunks: Option<Vec<String>> = None;

        loop {
            let line = next_line(transport, &self.abort, self.max_idle_reads, "image frame")?;
            if line.is_empty() {
                continue;
            }

            if line == START_MARK {
                if chunks.as_ref().is_some_and(|c| !c.is_empty()) {
                    crate::log("Frame restarted before END marker, dropping partial payload");
                }
                chunks = Some(Vec::new());
                continue;
            }

            if line == END_MARK {
                match chunks.take() {
                    Some(chunks) => {
                        return Ok(Frame {
                            payload: chunks.concat(),
                            chunks: chunks.len(),
                        });
                    }
                    None => continue,
                }
            }

            if is_sentinel(&line) {
                continue;
            }

            if let Some(chunks) = chunks.as_mut() {
                chunks.push(line);
            }
        }
    }
}

/// Waits for the device to report it is idle.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    max_idle_reads: u32,
    abort: Arc<AtomicBool>,
}

impl ReadinessGate {
    pub fn new(max_idle_reads: u32, abort: Arc<AtomicBool>) -> Self {
        Self {
            max_idle_reads: max_idle_reads.max(1),
            abort,
        }
    }

    /// Blocks until a line exactly equal to `READY` arrives.
    pub fn await_ready<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), LinkError> {
        loop {
            let line = next_line(transport, &self.abort, self.max_idle_reads, "READY")?;
            if line == READY_MARK {
                return Ok(());
            }
        }
    }
}
