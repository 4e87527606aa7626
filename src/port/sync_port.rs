//! Hardware serial port transport.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! [`AtTransport`] trait. A short read timeout turns the blocking read into
//! the poll the AT engine expects.

use super::error::PortError;
use super::traits::AtTransport;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Read timeout used when none is configured.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port at 8N1, no flow control.
    ///
    /// # Arguments
    /// * `port_name` - The system path to the serial port (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Initial line rate; discovery will switch it as needed
    /// * `poll_timeout` - How long a single byte poll may block
    ///
    /// # Example
    /// ```no_run
    /// use atcommander::port::{SyncSerialPort, DEFAULT_POLL_TIMEOUT};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", 9600, DEFAULT_POLL_TIMEOUT)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        poll_timeout: Duration,
    ) -> Result<Self, PortError> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(poll_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        debug!("Opened {} at {} baud", port_name, baud_rate);
        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    /// Get the name/path of this serial port.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AtTransport for SyncSerialPort {
    fn write_byte(&mut self, byte: u8) -> Result<(), PortError> {
        self.port.write_all(&[byte]).map_err(PortError::Io)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn delay_ms(&mut self, ms: u64) -> Result<(), PortError> {
        std::thread::sleep(Duration::from_millis(ms));
        Ok(())
    }

    fn set_baud(&mut self, baud: u32) -> Result<(), PortError> {
        self.port.set_baud_rate(baud).map_err(PortError::Serial)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

/// Summary of a serial port found on the system.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// List the serial ports available on this machine.
pub fn list_ports() -> Result<Vec<PortSummary>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let (kind, manufacturer, product) = match info.port_type {
                serialport::SerialPortType::UsbPort(usb) => (
                    format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
                    usb.manufacturer,
                    usb.product,
                ),
                serialport::SerialPortType::BluetoothPort => ("bluetooth".to_string(), None, None),
                serialport::SerialPortType::PciPort => ("pci".to_string(), None, None),
                serialport::SerialPortType::Unknown => ("unknown".to_string(), None, None),
            };
            PortSummary {
                name: info.port_name,
                kind,
                manufacturer,
                product,
            }
        })
        .collect())
}
