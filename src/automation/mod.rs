//! Capture-decide automation for the loot scout.
//!
//! This module provides:
//! - Session configuration loaded from config.json
//! - The pure loot decision
//! - The session state machine and the loop that drives it
//! - Operator notification, frame archival and the readings CSV

pub mod archive;
pub mod config;
pub mod decision;
pub mod ledger;
pub mod notify;
pub mod runner;
pub mod state;

pub use archive::CaptureArchive;
pub use config::load_config;
pub use notify::{DesktopNotifier, LogNotifier, StdinAcknowledger};
pub use runner::{create_session_dir, run_session};
pub use state::{Collaborators, SessionController};
