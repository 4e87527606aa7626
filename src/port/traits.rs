//! Core transport trait.
//!
//! The AT engine only ever needs four primitive operations from the host.
//! Each of them is optional: a transport that cannot, for example, switch
//! its line rate simply keeps the default method, which reports
//! [`PortError::Unsupported`].

use super::error::{Capability, PortError};

/// Byte-level link to an AT-command device.
///
/// `read_byte` is a poll: `Ok(None)` means no byte is available right now,
/// not end of stream.
pub trait AtTransport: Send {
    /// Emit one byte on the line.
    fn write_byte(&mut self, _byte: u8) -> Result<(), PortError> {
        Err(PortError::Unsupported(Capability::Write))
    }

    /// Poll for one received byte.
    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        Err(PortError::Unsupported(Capability::Read))
    }

    /// Block the calling thread for at least `ms` milliseconds.
    fn delay_ms(&mut self, _ms: u64) -> Result<(), PortError> {
        Err(PortError::Unsupported(Capability::Delay))
    }

    /// Reconfigure the UART line rate. Takes effect for subsequent I/O.
    fn set_baud(&mut self, _baud: u32) -> Result<(), PortError> {
        Err(PortError::Unsupported(Capability::SetBaud))
    }
}

impl<T: AtTransport + ?Sized> AtTransport for Box<T> {
    fn write_byte(&mut self, byte: u8) -> Result<(), PortError> {
        (**self).write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        (**self).read_byte()
    }

    fn delay_ms(&mut self, ms: u64) -> Result<(), PortError> {
        (**self).delay_ms(ms)
    }

    fn set_baud(&mut self, baud: u32) -> Result<(), PortError> {
        (**self).set_baud(baud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl AtTransport for Bare {}

    #[test]
    fn test_defaults_report_unsupported() {
        let mut t = Bare;
        assert!(matches!(
            t.write_byte(b'a'),
            Err(PortError::Unsupported(Capability::Write))
        ));
        assert!(matches!(
            t.read_byte(),
            Err(PortError::Unsupported(Capability::Read))
        ));
        assert!(matches!(
            t.delay_ms(10),
            Err(PortError::Unsupported(Capability::Delay))
        ));
        assert!(matches!(
            t.set_baud(9600),
            Err(PortError::Unsupported(Capability::SetBaud))
        ));
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mut t: Box<dyn AtTransport> = Box::new(Bare);
        assert!(t.write_byte(0).unwrap_err().is_unsupported());
    }
}
