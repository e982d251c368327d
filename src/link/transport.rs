//! Line-oriented transport over the serial port.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use anyhow::Result;
use serialport::{ClearBuffer, SerialPort};

use crate::error::LinkError;

/// Byte stream the session talks to the device through.
///
/// `read_line` returns `Ok(None)` when the read timeout elapses before a
/// complete line arrives.
pub trait Transport {
    fn read_line(&mut self) -> Result<Option<String>, LinkError>;

    /// Writes `text` followed by a newline and flushes.
    fn write_line(&mut self, text: &str) -> Result<(), LinkError>;

    /// Discards everything pending in both directions. Returns the number of
    /// input bytes thrown away.
    fn drain(&mut self) -> Result<usize, LinkError>;
}

/// Longest partial line kept while waiting for a newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Accumulates raw bytes and hands out complete lines.
///
/// Bytes received before a timeout stay buffered so a line split across two
/// reads is still returned whole.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Appends received bytes. If the unterminated tail grows past
    /// `MAX_LINE_BYTES` it is discarded; returns how many bytes were dropped.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        self.pending.extend_from_slice(bytes);

        let tail_start = self
            .pending
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        let tail = self.pending.len() - tail_start;
        if tail > MAX_LINE_BYTES {
            self.pending.truncate(tail_start);
            return tail;
        }
        0
    }

    /// Pops the next newline-terminated line, trimmed.
    ///
    /// Invalid UTF-8 is dropped rather than replaced.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&raw).replace('\u{FFFD}', "");
        Some(text.trim().to_string())
    }

    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }
}

/// Transport backed by a real serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
}

impl SerialTransport {
    /// Opens `path` at `baud_rate` with the given per-read timeout.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, LinkError> {
        let port = serialport::new(path, baud_rate)
            .timeout(read_timeout)
            .open()?;

        crate::log(&format!(
            "Opened {} at {} baud (read timeout {:.1}s)",
            path,
            baud_rate,
            read_timeout.as_secs_f32()
        ));

        Ok(Self {
            port,
            buffer: LineBuffer::default(),
        })
    }
}

impl Transport for SerialTransport {
    fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(line) = self.buffer.next_line() {
                return Ok(Some(line));
            }

            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    let dropped = self.buffer.push(&chunk[..n]);
                    if dropped > 0 {
                        crate::log(&format!(
                            "Discarded {} bytes without a line break (baud rate mismatch?)",
                            dropped
                        ));
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e)),
            }
        }
    }

    fn write_line(&mut self, text: &str) -> Result<(), LinkError> {
        self.port.write_all(text.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }

    fn drain(&mut self) -> Result<usize, LinkError> {
        let waiting = self.port.bytes_to_read()? as usize;
        self.port.clear(ClearBuffer::All)?;
        Ok(waiting + self.buffer.clear())
    }
}

/// Returns the names of the serial ports present on this machine.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_splits_lines() {
        let mut buf = LineBuffer::default();
        buf.push(b"READY\r\nabc\n");
        assert_eq!(buf.next_line().as_deref(), Some("READY"));
        assert_eq!(buf.next_line().as_deref(), Some("abc"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_line_buffer_keeps_partial_line() {
        let mut buf = LineBuffer::default();
        buf.push(b"-----START-");
        assert_eq!(buf.next_line(), None);
        buf.push(b"IMAGE-----\n");
        assert_eq!(buf.next_line().as_deref(), Some("-----START-IMAGE-----"));
    }

    #[test]
    fn test_line_buffer_drops_invalid_utf8() {
        let mut buf = LineBuffer::default();
        buf.push(&[0xFF, b'R', b'E', b'A', b'D', b'Y', 0xFE, b'\n']);
        assert_eq!(buf.next_line().as_deref(), Some("READY"));
    }

    #[test]
    fn test_line_buffer_caps_unterminated_line() {
        let mut buf = LineBuffer::default();
        assert_eq!(buf.push(b"READY\n"), 0);
        assert_eq!(buf.push(&vec![b'x'; MAX_LINE_BYTES]), 0);
        assert_eq!(buf.push(b"xx"), MAX_LINE_BYTES + 2);

        // Complete lines before the runaway tail survive
        assert_eq!(buf.next_line().as_deref(), Some("READY"));
        assert_eq!(buf.next_line(), None);

        buf.push(b"ok\n");
        assert_eq!(buf.next_line().as_deref(), Some("ok"));
    }

    #[test]
    fn test_line_buffer_clear_counts_bytes() {
        let mut buf = LineBuffer::default();
        buf.push(b"garbage");
        assert_eq!(buf.clear(), 7);
        assert_eq!(buf.next_line(), None);
    }
}
