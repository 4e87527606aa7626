//! Session state machine.
//!
//! Tracks whether the device is in command mode and at which line rate, and
//! drives discovery, mode changes, baud changes, storing and rebooting on
//! top of the command/response engine.

use super::link::Link;
use crate::diagnostics::DiagnosticSink;
use crate::error::{AtError, AtResult, Operation};
use crate::port::{AtTransport, PortError};
use crate::profile::PlatformProfile;
use serde::Serialize;
use tracing::{info, warn};

/// UART rates probed during discovery, in probing order.
pub const CANDIDATE_BAUD_RATES: &[u32] = &[1200, 9600, 19200, 38400, 57600, 115200];

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Device is passing data through transparently.
    Disconnected,
    /// Device accepts AT commands. `baud` is the host UART rate, unknown
    /// when the transport cannot switch rates.
    CommandMode { baud: Option<u32> },
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub profile: String,
    #[serde(flatten)]
    pub state: SessionState,
    pub uart_baud: Option<u32>,
    pub device_baud: Option<u32>,
}

/// An AT-command configuration session with one device.
///
/// Not safe for concurrent use; every operation runs to completion on the
/// caller's thread. Use one session per physical link.
///
/// # Example
/// ```
/// use atcommander::{AtCommander, MockAtDevice, RN42};
///
/// let mut device = MockAtDevice::new(9600);
/// device.respond(b"$$$", b"CMD\r\n").respond(b"---", b"END\r\n");
///
/// let mut session = AtCommander::new(device, RN42);
/// assert_eq!(session.enter_command_mode().unwrap(), Some(9600));
/// session.exit_command_mode().unwrap();
/// assert!(!session.is_connected());
/// ```
#[derive(Debug)]
pub struct AtCommander<T> {
    link: Link<T>,
    profile: PlatformProfile,
    state: SessionState,
    /// Rate the host UART was last set to.
    uart_baud: Option<u32>,
    /// Rate the device was last told to use.
    device_baud: Option<u32>,
    candidate_bauds: Vec<u32>,
}

impl<T: AtTransport> AtCommander<T> {
    pub fn new(transport: T, profile: PlatformProfile) -> Self {
        Self {
            link: Link::new(transport),
            profile,
            state: SessionState::Disconnected,
            uart_baud: None,
            device_baud: None,
            candidate_bauds: CANDIDATE_BAUD_RATES.to_vec(),
        }
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.link = self.link.with_diagnostics(sink);
        self
    }

    /// Replace the discovery candidates. Order is kept and duplicates are
    /// dropped, so no rate is tried twice in one pass.
    pub fn with_candidate_bauds(mut self, bauds: impl IntoIterator<Item = u32>) -> Self {
        let mut unique = Vec::new();
        for baud in bauds {
            if !unique.contains(&baud) {
                unique.push(baud);
            }
        }
        self.candidate_bauds = unique;
        self
    }

    /// Record the rate the transport was opened at.
    pub fn with_uart_baud(mut self, baud: u32) -> Self {
        self.uart_baud = Some(baud);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::CommandMode { .. })
    }

    pub fn uart_baud(&self) -> Option<u32> {
        self.uart_baud
    }

    pub fn device_baud(&self) -> Option<u32> {
        self.device_baud
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn candidate_bauds(&self) -> &[u32] {
        &self.candidate_bauds
    }

    pub fn transport(&self) -> &T {
        self.link.transport()
    }

    pub fn into_transport(self) -> T {
        self.link.into_transport()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            profile: self.profile.name.to_string(),
            state: self.state,
            uart_baud: self.uart_baud,
            device_baud: self.device_baud,
        }
    }

    /// Switch the host UART. A transport without a baud initializer is
    /// probed at whatever rate it already runs.
    fn initialize_baud(&mut self, baud: u32) -> AtResult<()> {
        match self.link.transport_mut().set_baud(baud) {
            Ok(()) => {
                self.link.debug(&format!("Initializing at baud {}", baud));
                self.uart_baud = Some(baud);
                Ok(())
            }
            Err(PortError::Unsupported(_)) => {
                self.link
                    .debug("No baud rate initializer set, can't change baud - trying anyway");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issue the profile's command for `op` and verify its reply.
    fn issue(&mut self, op: Operation, value: Option<u32>) -> AtResult<()> {
        let descriptor = self
            .profile
            .descriptor(op)
            .ok_or(AtError::Unsupported(op))?;
        let expected = descriptor
            .expected_response()
            .ok_or(AtError::Unsupported(op))?;
        let request = match value {
            Some(v) => descriptor.render(v),
            None => descriptor.request.to_string(),
        };
        self.link
            .request(&request, expected, self.profile.response_delay_ms)
    }

    /// Find the device's line rate and put it in command mode.
    ///
    /// Each candidate rate is tried once, in order, stopping at the first
    /// that answers. A transport error at one rate only rules out that rate.
    /// Returns the UART rate command mode is open at, `None` if the transport
    /// never switched rates; when already in command mode nothing is sent.
    pub fn enter_command_mode(&mut self) -> AtResult<Option<u32>> {
        if let SessionState::CommandMode { baud } = self.state {
            self.link.debug("Already in command mode");
            return Ok(baud);
        }

        let candidates = self.candidate_bauds.clone();
        for &baud in &candidates {
            if let Err(e) = self.initialize_baud(baud) {
                warn!("Skipping {} baud: {}", baud, e);
                self.link
                    .debug(&format!("Unable to switch UART to baud {}: {}", baud, e));
                continue;
            }

            self.link.debug("Attempting to enter command mode");
            match self.issue(Operation::EnterCommandMode, None) {
                Ok(()) => {
                    let uart = self.uart_baud;
                    self.state = SessionState::CommandMode { baud: uart };
                    match uart {
                        Some(rate) => {
                            self.link.debug(&format!(
                                "Initialized UART and entered command mode at baud {}",
                                rate
                            ));
                            info!("{} in command mode at {} baud", self.profile.name, rate);
                        }
                        None => {
                            self.link.debug("Entered command mode at an unknown baud");
                            info!("{} in command mode", self.profile.name);
                        }
                    }
                    return Ok(uart);
                }
                Err(e) if e.is_response_failure() => continue,
                Err(AtError::Port(e)) => {
                    warn!("Transport error at {} baud: {}", baud, e);
                    self.link
                        .debug(&format!("Transport error at baud {}: {}", baud, e));
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        self.link
            .debug("Unable to enter command mode at any baud rate");
        Err(AtError::CommandModeUnavailable {
            attempted: candidates.len(),
        })
    }

    /// Return the device to data mode. A failed exit leaves the session in
    /// command mode.
    pub fn exit_command_mode(&mut self) -> AtResult<()> {
        if self.state == SessionState::Disconnected {
            self.link.debug("Not in command mode");
            return Ok(());
        }

        match self.issue(Operation::ExitCommandMode, None) {
            Ok(()) => {
                self.link.debug("Switched back to data mode");
                self.state = SessionState::Disconnected;
                Ok(())
            }
            Err(e) => {
                self.link.debug("Unable to exit command mode");
                Err(e)
            }
        }
    }

    /// Tell the device to use `baud`, then try to persist it.
    ///
    /// Storing is best effort: its outcome is logged but does not change the
    /// result. On failure the recorded device baud is left untouched.
    pub fn set_baud_rate(&mut self, baud: u32) -> AtResult<()> {
        if !self.profile.supports(Operation::SetBaudRate) {
            return Err(AtError::Unsupported(Operation::SetBaudRate));
        }
        let value = self.profile.baud_mapping.encode(baud)?;

        if let Err(e) = self.enter_command_mode() {
            self.link
                .debug("Unable to enter command mode, can't set baud rate");
            return Err(e);
        }

        if let Err(e) = self.issue(Operation::SetBaudRate, Some(value)) {
            self.link.debug("Unable to change device baud rate");
            return Err(e);
        }

        self.link
            .debug(&format!("Changed device baud rate to {}", baud));
        self.device_baud = Some(baud);

        match self.store_settings() {
            Ok(()) | Err(AtError::Unsupported(_)) => {}
            Err(e) => warn!("Baud rate {} set but not stored: {}", baud, e),
        }
        Ok(())
    }

    /// Persist the current settings. Families without a store command fail
    /// with [`AtError::Unsupported`] and send nothing.
    pub fn store_settings(&mut self) -> AtResult<()> {
        if !self.profile.supports(Operation::StoreSettings) {
            return Err(AtError::Unsupported(Operation::StoreSettings));
        }

        match self.issue(Operation::StoreSettings, None) {
            Ok(()) => {
                self.link.debug("Stored settings into flash memory");
                Ok(())
            }
            Err(e) => {
                self.link
                    .debug("Unable to store settings in flash memory");
                Err(e)
            }
        }
    }

    /// Restart the device.
    ///
    /// The reboot command is written without waiting for a reply, since the
    /// device drops the link while restarting. The device comes back in data
    /// mode, so the session is marked disconnected.
    pub fn reboot(&mut self) -> AtResult<()> {
        let request = self
            .profile
            .reboot
            .as_ref()
            .map(|d| d.request.clone())
            .ok_or(AtError::Unsupported(Operation::Reboot))?;

        if let Err(e) = self.enter_command_mode() {
            self.link.debug("Unable to enter command mode, can't reboot");
            return Err(e);
        }

        self.link.write_bytes(request.as_bytes())?;
        self.link
            .debug(&format!("Rebooting {}", self.profile.name));
        self.state = SessionState::Disconnected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::port::{MockAtDevice, TransportFns};
    use crate::profile::{RN42, XBEE};
    use pretty_assertions::assert_eq;

    fn rn42_device(baud: u32) -> MockAtDevice {
        let mut device = MockAtDevice::new(baud);
        device
            .respond(b"$$$", b"CMD\r\n")
            .respond(b"---", b"END\r\n");
        device
    }

    #[test]
    fn test_discovery_stops_at_first_answer() {
        let device = rn42_device(19200);
        let mut session = AtCommander::new(device.clone(), RN42);

        assert_eq!(session.enter_command_mode().unwrap(), Some(19200));
        assert_eq!(device.baud_changes(), vec![1200, 9600, 19200]);
        assert_eq!(
            session.state(),
            SessionState::CommandMode { baud: Some(19200) }
        );
        assert_eq!(session.uart_baud(), Some(19200));
    }

    #[test]
    fn test_discovery_exhausts_candidates_once() {
        let device = MockAtDevice::new(300);
        let mut session = AtCommander::new(device.clone(), RN42);

        let err = session.enter_command_mode().unwrap_err();
        assert!(matches!(
            err,
            AtError::CommandModeUnavailable { attempted: 6 }
        ));
        assert_eq!(device.baud_changes(), CANDIDATE_BAUD_RATES.to_vec());
        assert_eq!(device.written_string(), "$$$".repeat(6));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_custom_candidates_are_deduplicated() {
        let device = rn42_device(57600);
        let mut session =
            AtCommander::new(device.clone(), RN42).with_candidate_bauds([57600, 9600, 57600]);

        assert_eq!(session.candidate_bauds(), &[57600, 9600]);
        assert_eq!(session.enter_command_mode().unwrap(), Some(57600));
        assert_eq!(device.baud_changes(), vec![57600]);
    }

    #[test]
    fn test_discovery_without_baud_initializer() {
        let mut device = rn42_device(9600);
        let mut reader = device.clone();
        let mut writer = device.clone();
        let transport = TransportFns::new()
            .write(move |b| {
                let _ = writer.write_byte(b);
            })
            .read(move || reader.read_byte().ok().flatten());
        device.clear_logs();

        let sink = RecordingSink::new();
        let mut session = AtCommander::new(transport, RN42).with_diagnostics(sink.clone());

        assert_eq!(session.enter_command_mode().unwrap(), None);
        assert_eq!(session.uart_baud(), None);
        assert_eq!(session.state(), SessionState::CommandMode { baud: None });
        assert!(sink.contains("No baud rate initializer set"));
        assert!(sink.contains("unknown baud"));
    }

    #[test]
    fn test_discovery_without_baud_initializer_keeps_opened_rate() {
        let device = rn42_device(57600);
        let mut reader = device.clone();
        let mut writer = device.clone();
        let transport = TransportFns::new()
            .write(move |b| {
                let _ = writer.write_byte(b);
            })
            .read(move || reader.read_byte().ok().flatten());

        let mut session = AtCommander::new(transport, RN42).with_uart_baud(57600);
        assert_eq!(session.enter_command_mode().unwrap(), Some(57600));
    }

    /// Reads fail with an I/O error while the line is at 1200 baud.
    struct NoisyAtLowBaud {
        device: MockAtDevice,
        baud: u32,
    }

    impl AtTransport for NoisyAtLowBaud {
        fn write_byte(&mut self, byte: u8) -> Result<(), PortError> {
            self.device.write_byte(byte)
        }

        fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
            if self.baud == 1200 {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "framing error",
                )));
            }
            self.device.read_byte()
        }

        fn set_baud(&mut self, baud: u32) -> Result<(), PortError> {
            self.baud = baud;
            self.device.set_baud(baud)
        }
    }

    #[test]
    fn test_transport_error_moves_to_next_candidate() {
        let device = rn42_device(9600);
        let transport = NoisyAtLowBaud {
            device: device.clone(),
            baud: 0,
        };
        let sink = RecordingSink::new();
        let mut session = AtCommander::new(transport, RN42).with_diagnostics(sink.clone());

        assert_eq!(session.enter_command_mode().unwrap(), Some(9600));
        assert_eq!(device.baud_changes(), vec![1200, 9600]);
        assert!(sink.contains("Transport error at baud 1200"));
    }

    #[test]
    fn test_exit_when_disconnected_sends_nothing() {
        let device = rn42_device(9600);
        let mut session = AtCommander::new(device.clone(), RN42);

        session.exit_command_mode().unwrap();
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_exit_unsupported_keeps_command_mode() {
        let mut device = MockAtDevice::new(9600);
        device.respond(b"+++", b"OK");
        let mut session = AtCommander::new(device.clone(), XBEE);
        session.enter_command_mode().unwrap();
        let written = device.written().len();

        let err = session.exit_command_mode().unwrap_err();
        assert!(matches!(
            err,
            AtError::Unsupported(Operation::ExitCommandMode)
        ));
        assert!(session.is_connected());
        assert_eq!(device.written().len(), written);
    }

    #[test]
    fn test_set_baud_rate_rn42() {
        let mut device = rn42_device(9600);
        device.respond(b"SU,115200\r\n", b"AOK\r\n");
        let mut session = AtCommander::new(device.clone(), RN42);

        session.set_baud_rate(115200).unwrap();
        assert_eq!(session.device_baud(), Some(115200));
        assert!(device.written_string().ends_with("SU,115200\r\n"));
    }

    #[test]
    fn test_set_baud_rate_xbee_maps_and_stores() {
        let mut device = MockAtDevice::new(9600);
        device
            .respond(b"+++", b"OK")
            .respond(b"ATBD 6\r\n", b"OK\r\n")
            .respond(b"ATWR\r\n", b"OK\r\n");
        let mut session = AtCommander::new(device.clone(), XBEE);

        session.set_baud_rate(57600).unwrap();
        assert_eq!(session.device_baud(), Some(57600));
        assert!(device.written_string().ends_with("ATBD 6\r\nATWR\r\n"));
    }

    #[test]
    fn test_set_baud_rate_succeeds_when_store_fails() {
        let mut device = MockAtDevice::new(9600);
        device
            .respond(b"+++", b"OK")
            .respond(b"ATBD 3\r\n", b"OK\r\n");
        let mut session = AtCommander::new(device, XBEE);

        session.set_baud_rate(9600).unwrap();
        assert_eq!(session.device_baud(), Some(9600));
    }

    #[test]
    fn test_set_baud_rate_unmappable_sends_nothing() {
        let device = MockAtDevice::new(9600);
        let mut session = AtCommander::new(device.clone(), XBEE);

        let err = session.set_baud_rate(300).unwrap_err();
        assert!(matches!(err, AtError::UnmappableBaud { baud: 300, .. }));
        assert!(device.written().is_empty());
        assert_eq!(session.device_baud(), None);
    }

    #[test]
    fn test_store_settings_unsupported_sends_nothing() {
        let device = rn42_device(9600);
        let mut session = AtCommander::new(device.clone(), RN42);

        let err = session.store_settings().unwrap_err();
        assert!(matches!(err, AtError::Unsupported(Operation::StoreSettings)));
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_reboot_writes_literal_and_disconnects() {
        let device = rn42_device(9600);
        let mut session = AtCommander::new(device.clone(), RN42);

        session.reboot().unwrap();
        assert!(device.written_string().ends_with("$$$R,1\r\n"));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_reboot_fails_without_command_mode() {
        let device = MockAtDevice::new(300);
        let mut session = AtCommander::new(device.clone(), RN42);

        assert!(session.reboot().is_err());
        assert!(!device.written_string().contains("R,1"));
    }

    #[test]
    fn test_reboot_unsupported() {
        let device = MockAtDevice::new(9600);
        let mut session = AtCommander::new(device.clone(), XBEE);

        let err = session.reboot().unwrap_err();
        assert!(matches!(err, AtError::Unsupported(Operation::Reboot)));
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_report_serializes_state() {
        let device = rn42_device(9600);
        let mut session = AtCommander::new(device, RN42);
        session.enter_command_mode().unwrap();

        let json = serde_json::to_value(session.report()).unwrap();
        assert_eq!(json["profile"], "RN-42");
        assert_eq!(json["state"], "command_mode");
        assert_eq!(json["baud"], 9600);
        assert_eq!(json["uart_baud"], 9600);
        assert!(json["device_baud"].is_null());
    }
}
