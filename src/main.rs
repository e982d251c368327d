//! Loot Scout
//!
//! Drives an ESP32-CAM over a serial link: requests a photo of the phone's
//! attack screen, OCRs the gold / elixir / dark elixir counters and keeps
//! tapping "next" until a base clears the configured loot thresholds.

mod automation;
mod error;
mod link;
mod ocr;
mod paths;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use automation::notify::{Acknowledger, Notifier};
use automation::{
    CaptureArchive, Collaborators, DesktopNotifier, LogNotifier, SessionController,
    StdinAcknowledger,
};
use link::SerialTransport;
use ocr::setup::TesseractPaths;
use ocr::TesseractCli;

const LOG_FILE: &str = "loot_scout.log";

/// Writes a timestamped line to stdout and the log file.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join(LOG_FILE);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "loot-scout",
    version,
    about = "Scouts bases through a serial camera and stops on good loot."
)]
struct Cli {
    /// Path to config.json (default: next to the executable).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port to open, overriding config.json.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate, overriding config.json.
    #[arg(long)]
    baud: Option<u32>,

    /// Start immediately instead of waiting for <Enter>.
    #[arg(long, default_value_t = false)]
    no_prompt: bool,

    /// List available serial ports and exit.
    #[arg(long, default_value_t = false)]
    list_ports: bool,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_logs_dir().join(LOG_FILE))
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let cli = Cli::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;

    if cli.list_ports {
        let ports = link::list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        }
        for port in ports {
            println!("{}", port);
        }
        return Ok(());
    }

    let mut config = automation::load_config(cli.config.as_deref());
    if let Some(port) = cli.port {
        config.serial_port = port;
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }

    log(&format!(
        "Thresholds: gold >= {}, elixir >= {}, dark >= {}",
        config.thresholds.gold_min, config.thresholds.elixir_min, config.thresholds.dark_min
    ));

    // Missing Tesseract is not fatal here: every cycle will fail with an OCR
    // error and back off until it is installed.
    let tesseract = match ocr::ensure_tesseract(config.tesseract_path.as_deref()) {
        Ok(paths) => paths,
        Err(e) => {
            log(&format!("Warning: Failed to setup Tesseract: {}", e));
            log("OCR will fail until Tesseract is installed.");
            TesseractPaths {
                executable: PathBuf::from("tesseract"),
                tessdata: None,
            }
        }
    };

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = abort.clone();
        ctrlc::set_handler(move || {
            if abort.swap(true, Ordering::SeqCst) {
                log("Second interrupt, exiting immediately.");
                std::process::exit(0);
            }
            log("Interrupt received, stopping after the current step (Ctrl-C again to force).");
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let acknowledger = StdinAcknowledger;
    if !cli.no_prompt {
        acknowledger.wait_for_ack("Press <Enter> to start loot detection ...")?;
    }
    if abort.load(Ordering::SeqCst) {
        log("Stopped by user.");
        return Ok(());
    }

    let session_dir = automation::create_session_dir()?;
    let ledger = session_dir.join("results.csv");
    automation::ledger::init_csv(&ledger)?;
    log(&format!("Session folder: {}", session_dir.display()));

    let transport = SerialTransport::open(
        &config.serial_port,
        config.baud_rate,
        config.read_timeout(),
    )
    .with_context(|| format!("Failed to open serial port {}", config.serial_port))?;

    let notifier: Box<dyn Notifier> = if config.notify {
        Box::new(DesktopNotifier)
    } else {
        Box::new(LogNotifier)
    };
    let parts = Collaborators {
        engine: Box::new(TesseractCli::new(tesseract)),
        notifier,
        acknowledger: Box::new(acknowledger),
        archive: config
            .save_captures
            .then(|| CaptureArchive::new(session_dir.join("captures"))),
        ledger: Some(ledger),
    };

    if let Some(archive) = &parts.archive {
        log(&format!("Captures: {}", archive.dir().display()));
    }

    let session = SessionController::new(transport, config, parts, abort);
    automation::run_session(session)?;
    Ok(())
}
