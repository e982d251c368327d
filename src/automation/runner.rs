//! Session runner - main entry point for the capture loop.
//!
//! Runs cycles until the abort flag is raised. A failed cycle is logged,
//! followed by a cooldown, and the loop resumes from Idle.

use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::automation::decision::Verdict;
use crate::automation::state::{SessionController, SessionStats};
use crate::error::CycleError;
use crate::link::Transport;

/// Longest uninterrupted sleep between abort checks.
const PAUSE_SLICE: Duration = Duration::from_millis(100);

/// Sleeps for `duration`, waking early if `abort` is raised.
///
/// Returns `false` if the pause was cut short by an abort.
pub fn pause(abort: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if abort.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(PAUSE_SLICE.min(deadline - now));
    }
}

/// Creates a timestamped session folder: `<sessions>/YYYYMMDD_HHMMSS/`.
pub fn create_session_dir() -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session_dir = crate::paths::get_sessions_dir().join(&timestamp);

    fs::create_dir_all(&session_dir)
        .map_err(|e| anyhow!("Failed to create session directory: {}", e))?;

    Ok(session_dir)
}

/// Runs the capture loop until the user stops it, then closes the link.
pub fn run_session<T: Transport>(mut session: SessionController<T>) -> Result<SessionStats> {
    crate::log("Started listener ... (Ctrl-C to stop)");

    // Let the board finish booting before talking to it
    if pause(session.abort_flag(), session.config().boot_delay()) {
        let mut flushed = false;

        loop {
            let outcome = if flushed {
                session.run_cycle()
            } else {
                session
                    .flush_input()
                    .map(|()| flushed = true)
                    .map_err(CycleError::from)
            };

            match outcome {
                Ok(()) => {
                    if session.last_verdict() == Some(Verdict::Match) {
                        let stats = session.stats();
                        crate::log(&format!(
                            "Match after {} cycles ({} skipped, {} empty, {} failed)",
                            stats.cycles, stats.skips, stats.empties, stats.failures
                        ));
                    }
                }
                Err(e) if e.is_interrupt() => break,
                Err(e) => {
                    crate::log(&format!("Error: {}", e));
                    session.recover();
                    let backoff = session.config().error_backoff();
                    if !pause(session.abort_flag(), backoff) {
                        break;
                    }
                }
            }
        }
    }

    crate::log("Stopped by user.");
    Ok(session.shutdown())
}
