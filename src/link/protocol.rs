//! Wire protocol spoken by the camera firmware.
//!
//! Host→device commands are single newline-terminated words. The device
//! answers a capture with a base64 payload between two marker lines, and
//! prints `READY` whenever it is idle again.

/// Line that opens an image payload.
pub const START_MARK: &str = "-----START-IMAGE-----";

/// Line that closes an image payload.
pub const END_MARK: &str = "-----END-IMAGE-----";

/// Line printed by the device once it accepts commands again.
pub const READY_MARK: &str = "READY";

/// Commands understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Take a photo and stream it back.
    Capture,
    /// Tap "next base" so a new view is loaded.
    Skip,
}

impl DeviceCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceCommand::Capture => "CAPTURE",
            DeviceCommand::Skip => "SKIP",
        }
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for lines that belong to the protocol rather than a payload.
pub fn is_sentinel(line: &str) -> bool {
    line == START_MARK || line == END_MARK || line == READY_MARK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_words() {
        assert_eq!(DeviceCommand::Capture.as_str(), "CAPTURE");
        assert_eq!(DeviceCommand::Skip.to_string(), "SKIP");
    }

    #[test]
    fn test_is_sentinel() {
        assert!(is_sentinel("-----START-IMAGE-----"));
        assert!(is_sentinel("-----END-IMAGE-----"));
        assert!(is_sentinel("READY"));
        assert!(!is_sentinel("READY!"));
        assert!(!is_sentinel("/9j/4AAQSkZJRgABAQ"));
    }
}
