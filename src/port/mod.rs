//! Transport layer for the AT engine.
//!
//! Provides the `AtTransport` trait plus a hardware, a closure-based and a
//! mock implementation, enabling dependency injection and testing.

pub mod error;
pub mod fn_transport;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::{Capability, PortError};
pub use fn_transport::TransportFns;
pub use mock::MockAtDevice;
pub use sync_port::{list_ports, PortSummary, SyncSerialPort, DEFAULT_POLL_TIMEOUT};
pub use traits::AtTransport;
