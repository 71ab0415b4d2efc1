//! Centralized error types for the modem channel
//!
//! Recoverable errors are represented by the `ModemError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, ModemError>`.
//!
//! Conditions that leave the modem in an unknown state are not errors a
//! caller can handle; they are reported as `FatalError` to the channel's
//! fatal handler.

use std::fmt;
use std::path::PathBuf;

use crate::at::Tag;

/// All recoverable channel errors
#[derive(Debug)]
pub enum ModemError {
    // === Transport ===
    /// Failed to open the modem device
    DeviceOpen {
        device: String,
        source: std::io::Error,
    },
    /// Failed to write a request to the device
    Write {
        request: String,
        source: std::io::Error,
    },
    /// The link was closed before the request could be sent
    LinkClosed,

    // === Conversation ===
    /// No matching reply arrived in time
    Timeout { request: String },
    /// A reply arrived but it is not one the caller can use
    Unexpected {
        request: String,
        response: &'static str,
    },
    /// The reply carried a recognized tag but its payload did not decode
    Rejected { tag: Tag },

    // === Config ===
    /// Config file could not be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Runtime ===
    /// Tokio runtime creation failed
    Runtime { source: std::io::Error },
}

impl std::error::Error for ModemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceOpen { source, .. }
            | Self::Write { source, .. }
            | Self::ConfigRead { source, .. }
            | Self::Runtime { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceOpen { device, .. } => write!(f, "Cannot open modem device: {}", device),
            Self::Write { request, .. } => write!(f, "Cannot send '{}'", request),
            Self::LinkClosed => write!(f, "Modem link is closed"),
            Self::Timeout { request } => write!(f, "Timeout for '{}'", request),
            Self::Unexpected { request, response } => {
                write!(f, "Unexpected response '{}' to '{}'", response, request)
            }
            Self::Rejected { tag } => write!(f, "Cannot parse +{} payload", tag),
            Self::ConfigRead { path, .. } => write!(f, "Cannot read config: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::Runtime { .. } => write!(f, "Failed to create runtime"),
        }
    }
}

/// Alias for Result with ModemError
pub type Result<T> = std::result::Result<T, ModemError>;

/// Unrecoverable channel conditions
///
/// Once the byte stream loses message boundaries, or the modem rejects the
/// initialization sequence, there is no safe way to continue.
#[derive(Debug)]
pub enum FatalError {
    /// The reader found input it cannot frame
    Desync { input: String },
    /// An initialization command was not acknowledged with OK
    InitFailed { command: String, reason: String },
    /// The device could not be opened after all attempts
    DeviceUnavailable { source: ModemError },
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceUnavailable { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desync { input } => write!(f, "Cannot parse the modem response: '{}'", input),
            Self::InitFailed { command, reason } => {
                write!(f, "Cannot init the modem channel at '{}': {}", command, reason)
            }
            Self::DeviceUnavailable { source } => write!(f, "{}", source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_timeout_display_names_request() {
        let err = ModemError::Timeout {
            request: "AT+CSQ".into(),
        };
        assert_eq!(err.to_string(), "Timeout for 'AT+CSQ'");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_write_error_has_source() {
        let err = ModemError::Write {
            request: "AT".into(),
            source: std::io::Error::other("broken pipe"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_rejected_display_uses_tag() {
        let err = ModemError::Rejected { tag: Tag::Csq };
        assert_eq!(err.to_string(), "Cannot parse +CSQ payload");
    }

    #[test]
    fn test_fatal_init_display() {
        let err = FatalError::InitFailed {
            command: "AT+CMEE=1".into(),
            reason: "ERROR".into(),
        };
        assert!(err.to_string().contains("AT+CMEE=1"));
    }
}
