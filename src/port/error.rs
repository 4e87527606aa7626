//! Transport-level error types.
//!
//! Kept separate from [`crate::error::AtError`] so that transport
//! implementations do not need to know anything about the AT protocol.

use std::fmt;
use thiserror::Error;

/// One independently optional capability of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Write,
    Read,
    Delay,
    SetBaud,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::Delay => "delay",
            Self::SetBaud => "baud rate initializer",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while talking to the physical link.
#[derive(Debug, Error)]
pub enum PortError {
    /// The transport does not provide this capability.
    #[error("Transport has no {0} capability")]
    Unsupported(Capability),

    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error only signals a missing capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
