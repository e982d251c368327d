//! Capture-decide state machine.
//!
//! One cycle sequences through: Idle → Requesting → AwaitingFrame →
//! Decoding → Deciding → {Notifying | Advancing | Waiting} → Idle.
//! Each step checks the abort flag first. A failed step leaves the machine
//! in Idle so the next cycle starts from a clean request.

use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::automation::archive::CaptureArchive;
use crate::automation::config::SessionConfig;
use crate::automation::decision::{decide, Verdict};
use crate::automation::ledger::append_reading;
use crate::automation::notify::{Acknowledger, Notifier};
use crate::automation::runner::pause;
use crate::error::{CycleError, LinkError};
use crate::link::frame::Frame;
use crate::link::{DeviceCommand, FrameReader, ReadinessGate, Transport};
use crate::ocr::extract::with_thousands;
use crate::ocr::{decode_frame, extract_text, parse_loot, LootParse, LootReading, OcrEngine};

/// Session state machine states.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Between cycles
    Idle,
    /// About to send CAPTURE
    Requesting,
    /// Waiting for the frame and the READY that follows it
    AwaitingFrame,
    /// Frame received, decoding and running OCR
    Decoding(Frame),
    /// OCR text parsed, choosing a verdict
    Deciding(LootParse),
    /// Good base: alert the operator and wait for them
    Notifying(LootReading),
    /// Sending SKIP to load the next base
    Advancing,
    /// Nothing on screen yet, pausing before the next capture
    Waiting,
    /// User requested stop
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Requesting => write!(f, "Requesting capture"),
            SessionState::AwaitingFrame => write!(f, "Awaiting frame"),
            SessionState::Decoding(frame) => write!(f, "Decoding ({} chunks)", frame.chunks),
            SessionState::Deciding(_) => write!(f, "Deciding"),
            SessionState::Notifying(_) => write!(f, "Notifying"),
            SessionState::Advancing => write!(f, "Advancing"),
            SessionState::Waiting => write!(f, "Waiting for base"),
            SessionState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// External collaborators the controller calls into.
pub struct Collaborators {
    pub engine: Box<dyn OcrEngine>,
    pub notifier: Box<dyn Notifier>,
    pub acknowledger: Box<dyn Acknowledger>,
    /// Where processed frames are saved, if anywhere
    pub archive: Option<CaptureArchive>,
    /// Readings CSV, if any
    pub ledger: Option<PathBuf>,
}

/// Running totals, logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub cycles: u32,
    pub matches: u32,
    pub skips: u32,
    pub empties: u32,
    pub failures: u32,
}

/// Owns the device link for the lifetime of the session and drives the
/// capture-decide cycle over it.
pub struct SessionController<T: Transport> {
    /// Current state
    pub state: SessionState,
    transport: T,
    config: SessionConfig,
    frames: FrameReader,
    ready: ReadinessGate,
    parts: Collaborators,
    abort: Arc<AtomicBool>,
    last_verdict: Option<Verdict>,
    stats: SessionStats,
}

impl<T: Transport> SessionController<T> {
    pub fn new(
        transport: T,
        config: SessionConfig,
        parts: Collaborators,
        abort: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            frames: FrameReader::new(config.max_idle_reads, abort.clone()),
            ready: ReadinessGate::new(config.ready_idle_reads, abort.clone()),
            transport,
            config,
            parts,
            abort,
            last_verdict: None,
            stats: SessionStats::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn abort_flag(&self) -> &AtomicBool {
        &self.abort
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Discards whatever the device printed while nobody was listening.
    pub fn flush_input(&mut self) -> Result<(), LinkError> {
        let drained = self.transport.drain()?;
        if drained > 0 {
            crate::log(&format!("Discarded {} stray bytes", drained));
        }
        Ok(())
    }

    /// Records a failed cycle and returns to Idle.
    pub fn recover(&mut self) {
        self.stats.failures += 1;
        if !matches!(self.state, SessionState::Stopped) {
            self.state = SessionState::Idle;
        }
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` if the session should continue, `Ok(false)` once stopped.
    pub fn step(&mut self) -> Result<bool, CycleError> {
        if self.abort.load(Ordering::SeqCst) {
            if !matches!(self.state, SessionState::Stopped) {
                crate::log("Abort requested, stopping session");
            }
            self.state = SessionState::Stopped;
            return Ok(false);
        }

        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.state = match state {
            SessionState::Idle => {
                self.stats.cycles += 1;
                self.last_verdict = None;
                SessionState::Requesting
            }

            SessionState::Requesting => {
                self.flush_input()?;
                self.transport.write_line(DeviceCommand::Capture.as_str())?;
                crate::log(&format!("Cycle {}: requested capture", self.stats.cycles));
                SessionState::AwaitingFrame
            }

            SessionState::AwaitingFrame => {
                let frame = self.frames.read_frame(&mut self.transport)?;
                self.ready.await_ready(&mut self.transport)?;
                crate::log(&format!(
                    "Cycle {}: frame received ({} chunks, {} base64 chars)",
                    self.stats.cycles,
                    frame.chunks,
                    frame.payload.len()
                ));
                SessionState::Decoding(frame)
            }

            SessionState::Decoding(frame) => {
                let img = decode_frame(&frame.payload)?;
                let output = extract_text(&img, self.config.ocr_threshold, self.parts.engine.as_ref())
                    .map_err(CycleError::Ocr)?;

                if let Some(archive) = &self.parts.archive {
                    match archive.save(&output.processed) {
                        Ok(path) => crate::log(&format!("Saved capture to {}", path.display())),
                        Err(e) => crate::log(&format!("Warning: {:#}", e)),
                    }
                }

                SessionState::Deciding(parse_loot(&output.text))
            }

            SessionState::Deciding(parsed) => {
                if parsed.is_degraded() {
                    crate::log("OCR text unusable, treating reading as empty");
                }
                let reading = parsed.reading();
                crate::log(&reading.to_string());

                let verdict = decide(&reading, &self.config.thresholds);
                self.last_verdict = Some(verdict);

                if let Some(ledger) = &self.parts.ledger {
                    if let Err(e) = append_reading(ledger, &Local::now(), &reading, verdict) {
                        crate::log(&format!("Warning: {:#}", e));
                    }
                }

                match verdict {
                    Verdict::Match => {
                        self.stats.matches += 1;
                        SessionState::Notifying(reading)
                    }
                    Verdict::Empty => {
                        self.stats.empties += 1;
                        SessionState::Waiting
                    }
                    Verdict::Skip => {
                        self.stats.skips += 1;
                        SessionState::Advancing
                    }
                }
            }

            SessionState::Notifying(reading) => {
                let message = format!(
                    "Gold: {}  Elixir: {}  Dark: {}",
                    with_thousands(reading.gold),
                    with_thousands(reading.elixir),
                    with_thousands(reading.dark)
                );
                crate::log(&format!("GOOD BASE FOUND! {}", message));

                if let Err(e) = self.parts.notifier.post_alert("GOOD BASE FOUND!", &message) {
                    crate::log(&format!("Warning: notification failed: {:#}", e));
                }

                self.parts
                    .acknowledger
                    .wait_for_ack("Good base! Review on phone, then press <Enter> ...")
                    .map_err(CycleError::Acknowledge)?;
                SessionState::Idle
            }

            SessionState::Waiting => {
                crate::log("Waiting for base ...");
                self.flush_input()?;
                self.sleep(self.config.skip_pause())?;
                SessionState::Idle
            }

            SessionState::Advancing => {
                crate::log("Skipping base ...");
                self.flush_input()?;
                self.transport.write_line(DeviceCommand::Skip.as_str())?;
                self.ready.await_ready(&mut self.transport)?;
                self.sleep(self.config.skip_pause())?;
                SessionState::Idle
            }

            SessionState::Stopped => {
                self.state = SessionState::Stopped;
                return Ok(false);
            }
        };

        Ok(true)
    }

    /// Runs steps until the machine is back in Idle.
    pub fn run_cycle(&mut self) -> Result<(), CycleError> {
        loop {
            if !self.step()? {
                return Err(CycleError::Stopped);
            }
            if matches!(self.state, SessionState::Idle) {
                return Ok(());
            }
        }
    }

    fn sleep(&self, duration: std::time::Duration) -> Result<(), CycleError> {
        if pause(&self.abort, duration) {
            Ok(())
        } else {
            Err(CycleError::Stopped)
        }
    }

    /// Ends the session, closing the transport. No further commands are sent.
    pub fn shutdown(self) -> SessionStats {
        let stats = self.stats;
        drop(self.transport);
        crate::log(&format!(
            "Session closed: {} cycles, {} matches, {} skips, {} empty, {} failures",
            stats.cycles, stats.matches, stats.skips, stats.empties, stats.failures
        ));
        stats
    }
}
