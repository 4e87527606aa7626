//! AT Commander Library
//!
//! Negotiates a configuration session with a serial module that speaks an
//! AT-style text protocol (RN-42 Bluetooth, XBee radios, ...) without
//! knowing its baud rate up front.
//!
//! # Modules
//!
//! - `port`: Transport trait plus hardware, closure and mock implementations
//! - `profile`: Per-family command sets and baud encodings
//! - `commander`: Framing primitives, request engine and session state machine
//! - `diagnostics`: Optional per-session narration sinks
//! - `config`: Configuration management with TOML support
//! - `error`: Unified error handling

pub mod commander;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod port;
pub mod profile;

// Re-export commonly used types for convenience
pub use commander::{
    AtCommander, Link, SessionReport, SessionState, CANDIDATE_BAUD_RATES, MAX_RETRIES,
    RETRY_DELAY_MS,
};
pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink};
pub use error::{AtError, AtResult, Operation};
pub use port::{AtTransport, Capability, MockAtDevice, PortError, SyncSerialPort, TransportFns};
pub use profile::{BaudMapping, CommandDescriptor, DeviceFamily, PlatformProfile, RN42, XBEE};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
