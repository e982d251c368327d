//! Operator-facing side of a match: a desktop alert and a blocking prompt.

use anyhow::{anyhow, Result};
use std::io::{self, BufRead, Write};
use std::process::Command;

/// Posts a one-shot alert to the operator.
pub trait Notifier {
    fn post_alert(&self, title: &str, message: &str) -> Result<()>;
}

/// Blocks until the operator confirms they have seen a match.
pub trait Acknowledger {
    fn wait_for_ack(&self, prompt: &str) -> io::Result<()>;
}

/// Uses the platform's notification command: `osascript` on macOS,
/// `notify-send` on Linux. Elsewhere the alert only goes to the log.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn post_alert(&self, title: &str, message: &str) -> Result<()> {
        let output = if cfg!(target_os = "macos") {
            Command::new("osascript")
                .arg("-e")
                .arg(applescript_notification(title, message))
                .output()?
        } else if cfg!(target_os = "linux") {
            Command::new("notify-send")
                .arg("--urgency=critical")
                .arg(title)
                .arg(message)
                .output()?
        } else {
            crate::log(&format!("[ALERT] {}: {}", title, message));
            return Ok(());
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Notification command failed: {}", stderr.trim()));
        }
        Ok(())
    }
}

/// Writes alerts to the log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post_alert(&self, title: &str, message: &str) -> Result<()> {
        crate::log(&format!("[ALERT] {}: {}", title, message));
        Ok(())
    }
}

/// Waits for Enter on stdin. EOF counts as an acknowledgement.
pub struct StdinAcknowledger;

impl Acknowledger for StdinAcknowledger {
    fn wait_for_ack(&self, prompt: &str) -> io::Result<()> {
        print!("{} ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

fn applescript_quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Builds the `display notification` script for osascript.
pub fn applescript_notification(title: &str, message: &str) -> String {
    format!(
        "display notification {} with title {} sound name \"Ping\"",
        applescript_quote(message),
        applescript_quote(title)
    )
}
