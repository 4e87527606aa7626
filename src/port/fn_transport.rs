//! Closure-backed transport.
//!
//! Lets a host hand over its UART primitives as plain functions, leaving
//! out whatever it does not have.

use super::error::{Capability, PortError};
use super::traits::AtTransport;

type WriteFn = Box<dyn FnMut(u8) + Send>;
type ReadFn = Box<dyn FnMut() -> Option<u8> + Send>;
type DelayFn = Box<dyn FnMut(u64) + Send>;
type BaudFn = Box<dyn FnMut(u32) + Send>;

/// A set of optional host functions acting as an [`AtTransport`].
///
/// # Example
/// ```
/// use atcommander::port::{AtTransport, TransportFns};
///
/// let mut transport = TransportFns::new()
///     .write(|byte| print!("{}", byte as char))
///     .read(|| None);
///
/// transport.write_byte(b'A').unwrap();
/// assert_eq!(transport.read_byte().unwrap(), None);
/// assert!(transport.set_baud(9600).is_err());
///
/// let mut transport = TransportFns::new().baud_initializer(|_| {});
/// assert!(transport.set_baud(9600).is_ok());
/// ```
#[derive(Default)]
pub struct TransportFns {
    write: Option<WriteFn>,
    read: Option<ReadFn>,
    delay: Option<DelayFn>,
    baud_initializer: Option<BaudFn>,
}

impl TransportFns {
    /// An empty function set; every capability is absent.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(mut self, f: impl FnMut(u8) + Send + 'static) -> Self {
        self.write = Some(Box::new(f));
        self
    }

    pub fn read(mut self, f: impl FnMut() -> Option<u8> + Send + 'static) -> Self {
        self.read = Some(Box::new(f));
        self
    }

    pub fn delay(mut self, f: impl FnMut(u64) + Send + 'static) -> Self {
        self.delay = Some(Box::new(f));
        self
    }

    /// Installs the baud rate initializer.
    pub fn baud_initializer(mut self, f: impl FnMut(u32) + Send + 'static) -> Self {
        self.baud_initializer = Some(Box::new(f));
        self
    }
}

impl AtTransport for TransportFns {
    fn write_byte(&mut self, byte: u8) -> Result<(), PortError> {
        let f = self
            .write
            .as_mut()
            .ok_or(PortError::Unsupported(Capability::Write))?;
        f(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let f = self
            .read
            .as_mut()
            .ok_or(PortError::Unsupported(Capability::Read))?;
        Ok(f())
    }

    fn delay_ms(&mut self, ms: u64) -> Result<(), PortError> {
        let f = self
            .delay
            .as_mut()
            .ok_or(PortError::Unsupported(Capability::Delay))?;
        f(ms);
        Ok(())
    }

    fn set_baud(&mut self, baud: u32) -> Result<(), PortError> {
        let f = self
            .baud_initializer
            .as_mut()
            .ok_or(PortError::Unsupported(Capability::SetBaud))?;
        f(baud);
        Ok(())
    }
}

impl std::fmt::Debug for TransportFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFns")
            .field("write", &self.write.is_some())
            .field("read", &self.read.is_some())
            .field("delay", &self.delay.is_some())
            .field("baud_initializer", &self.baud_initializer.is_some())
            .finish()
    }
}
