//! Serial link to the camera device.
//!
//! This module provides:
//! - The line-oriented transport over the serial port
//! - Command and sentinel constants of the wire protocol
//! - Frame reassembly and the readiness gate

pub mod frame;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use frame::{FrameReader, ReadinessGate};
pub use protocol::DeviceCommand;
pub use transport::{list_ports, SerialTransport, Transport};
