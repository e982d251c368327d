//! Error types for the capture-decide loop.
//!
//! Each pipeline stage returns its own error kind so the session runner can
//! decide between stopping (interrupt) and backing off (everything else).

use thiserror::Error;

/// Errors raised while talking to the camera device.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Reading or writing the serial stream failed.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable line arrived within the idle-read budget.
    #[error("timed out waiting for {waiting_for} ({idle_reads} idle reads)")]
    Timeout {
        /// What the reader was waiting for.
        waiting_for: &'static str,
        /// Consecutive reads that returned no data.
        idle_reads: u32,
    },

    /// The user asked the session to stop.
    #[error("interrupted by user")]
    Interrupted,
}

/// Errors raised while turning a frame payload into an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not an image the decoder understands.
    #[error("payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Failure of one capture-decide cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("OCR failed: {0:#}")]
    Ocr(anyhow::Error),

    #[error("operator acknowledgement failed: {0}")]
    Acknowledge(std::io::Error),

    /// The session was stopped at a step boundary.
    #[error("session stopped")]
    Stopped,
}

impl CycleError {
    /// Returns true if this error means the loop should end rather than retry.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            CycleError::Stopped | CycleError::Link(LinkError::Interrupted)
        )
    }
}
