//! Configuration for a scouting session.
//!
//! Loads settings from config.json at startup. Provides the serial link
//! parameters, loot thresholds and timing of the capture loop.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::automation::decision::Thresholds;

/// Complete session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Serial port the camera is attached to (e.g. `/dev/tty.usbserial-0001`, `COM3`)
    pub serial_port: String,
    pub baud_rate: u32,
    /// Timeout of a single serial read (milliseconds)
    pub read_timeout_ms: u64,
    /// Minimum loot for a base to be flagged
    pub thresholds: Thresholds,
    /// Pause after skipping a base or seeing an empty screen (seconds)
    pub skip_pause_secs: u64,
    /// Cooldown after a failed cycle (seconds)
    pub error_backoff_secs: u64,
    /// Delay before the first command so the board can finish booting (milliseconds)
    pub boot_delay_ms: u64,
    /// Consecutive timed-out reads tolerated while waiting for a frame
    pub max_idle_reads: u32,
    /// Consecutive timed-out reads tolerated while waiting for READY
    pub ready_idle_reads: u32,
    /// Brightness cutoff for digit ink (0-255)
    pub ocr_threshold: u8,
    /// Save every processed frame under the session's captures directory
    pub save_captures: bool,
    /// Post a desktop notification when a base matches
    pub notify: bool,
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            baud_rate: 460_800,
            read_timeout_ms: 10_000,
            thresholds: Thresholds::default(),
            skip_pause_secs: 5,
            error_backoff_secs: 7,
            boot_delay_ms: 1_000,
            max_idle_reads: 3,
            // 60s at the default read timeout
            ready_idle_reads: 6,
            ocr_threshold: 200,
            save_captures: true,
            notify: true,
            tesseract_path: None,
        }
    }
}

fn default_serial_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else if cfg!(target_os = "macos") {
        "/dev/tty.usbserial-0001".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

impl SessionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn skip_pause(&self) -> Duration {
        Duration::from_secs(self.skip_pause_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }
}

/// Returns `config.json` next to the executable.
pub fn default_config_path() -> PathBuf {
    crate::paths::get_exe_dir().join("config.json")
}

/// Loads configuration from `path` (or config.json next to the executable)
/// or returns defaults.
pub fn load_config(path: Option<&Path>) -> SessionConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    SessionConfig::default()
}

pub fn parse_config(contents: &str) -> serde_json::Result<SessionConfig> {
    serde_json::from_str(contents)
}
