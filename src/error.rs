//! Unified error type for AT command sessions.
//!
//! Every failure leaves the session in a well-defined state; none of these
//! errors is fatal to the process.

use crate::port::PortError;
use std::fmt;
use thiserror::Error;

/// A specialized `Result` type for AT operations.
pub type AtResult<T> = Result<T, AtError>;

/// Operations a platform profile may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    EnterCommandMode,
    ExitCommandMode,
    SetBaudRate,
    StoreSettings,
    Reboot,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnterCommandMode => "enter command mode",
            Self::ExitCommandMode => "exit command mode",
            Self::SetBaudRate => "set baud rate",
            Self::StoreSettings => "store settings",
            Self::Reboot => "reboot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AtError {
    /// Fewer (or more) bytes arrived than the expected response holds.
    #[error("Expected {expected} bytes in response but received {received}")]
    LengthMismatch { expected: usize, received: usize },

    /// The response had the right length but different content.
    #[error("Expected {expected:?} response but got {received:?}")]
    ContentMismatch { expected: String, received: String },

    /// The active profile has no command for this operation.
    #[error("Device profile does not support '{0}'")]
    Unsupported(Operation),

    /// The profile's baud mapping has no encoding for this rate.
    #[error("Baud rate {baud} cannot be encoded by the {mapping} mapping")]
    UnmappableBaud { baud: u32, mapping: &'static str },

    /// No candidate baud rate produced the enter-command-mode response.
    #[error("Unable to enter command mode at any of {attempted} baud rates")]
    CommandModeUnavailable { attempted: usize },

    /// The transport itself failed.
    #[error("Transport error: {0}")]
    Port(#[from] PortError),
}

impl AtError {
    /// True for the two response verification failures.
    pub fn is_response_failure(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. } | Self::ContentMismatch { .. }
        )
    }
}
