//! In-memory transport for tests.

use std::collections::VecDeque;

use super::protocol::{END_MARK, READY_MARK, START_MARK};
use super::transport::Transport;
use crate::error::LinkError;

/// Replays a fixed sequence of device output and records what was written.
///
/// `None` entries behave like a read timeout. Once the script runs out every
/// read times out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Option<String>>,
    pub written: Vec<String>,
    pub drains: usize,
    failing_drains: usize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: &str) -> Self {
        self.script.push_back(Some(line.to_string()));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    pub fn ready(self) -> Self {
        self.line(READY_MARK)
    }

    /// Appends a START/END framed payload split into the given chunks.
    pub fn frame(mut self, chunks: &[&str]) -> Self {
        self = self.line(START_MARK);
        for chunk in chunks {
            self = self.line(chunk);
        }
        self.line(END_MARK)
    }

    /// Makes the next `count` drains fail with an I/O error.
    pub fn fail_drains(mut self, count: usize) -> Self {
        self.failing_drains = count;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transport for ScriptedTransport {
    fn read_line(&mut self) -> Result<Option<String>, LinkError> {
        Ok(self.script.pop_front().flatten())
    }

    fn write_line(&mut self, text: &str) -> Result<(), LinkError> {
        self.written.push(text.to_string());
        Ok(())
    }

    fn drain(&mut self) -> Result<usize, LinkError> {
        self.drains += 1;
        if self.failing_drains > 0 {
            self.failing_drains -= 1;
            return Err(LinkError::Io(std::io::Error::other("port vanished")));
        }
        Ok(0)
    }
}
