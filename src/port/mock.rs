//! Mock AT device for testing.
//!
//! Provides a `MockAtDevice` that behaves like a module sitting on the other
//! end of a UART: it listens at one line rate, answers scripted requests and
//! records all traffic so tests can assert on it afterwards.

use super::error::PortError;
use super::traits::AtTransport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A scripted request and the bytes the device sends back for it.
#[derive(Debug, Clone)]
struct Script {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// Inner state of the mock device, shared between clones.
#[derive(Debug, Default)]
struct MockDeviceState {
    /// Line rate the device is listening at.
    device_baud: u32,
    /// Line rate the host UART is currently set to, if it was ever set.
    host_baud: Option<u32>,
    /// Bytes received since the last recognised request.
    pending: Vec<u8>,
    /// Scripted request/response pairs.
    scripts: Vec<Script>,
    /// Bytes queued for the host to read.
    read_queue: VecDeque<u8>,
    /// Every byte the host wrote, in order.
    write_log: Vec<u8>,
    /// Every baud rate the host switched to.
    baud_log: Vec<u32>,
    /// Every delay the host asked for.
    delay_log: Vec<u64>,
    /// Number of read polls, including empty ones.
    read_polls: usize,
}

/// Mock AT-command device implementing [`AtTransport`].
///
/// Responses are only produced while the host line rate matches the device
/// line rate. A host that never switched its rate is assumed to already be
/// at the right one.
///
/// # Example
/// ```
/// use atcommander::port::{AtTransport, MockAtDevice};
///
/// let mut device = MockAtDevice::new(9600);
/// device.respond(b"$$$", b"CMD\r\n");
///
/// for byte in b"$$$" {
///     device.write_byte(*byte).unwrap();
/// }
/// assert_eq!(device.read_byte().unwrap(), Some(b'C'));
/// assert_eq!(device.written(), b"$$$");
/// ```
#[derive(Clone)]
pub struct MockAtDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockAtDevice {
    /// Create a device listening at `device_baud`.
    pub fn new(device_baud: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState {
                device_baud,
                ..Default::default()
            })),
        }
    }

    /// Answer `request` with `response` whenever the host sends it at the
    /// device's line rate.
    pub fn respond(&mut self, request: &[u8], response: &[u8]) -> &mut Self {
        self.state.lock().scripts.push(Script {
            request: request.to_vec(),
            response: response.to_vec(),
        });
        self
    }

    /// Queue bytes for the host to read regardless of what it sends.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Change the rate the device listens at, as a real module does after
    /// its baud setting takes effect.
    pub fn set_device_baud(&mut self, baud: u32) {
        self.state.lock().device_baud = baud;
    }

    pub fn device_baud(&self) -> u32 {
        self.state.lock().device_baud
    }

    pub fn host_baud(&self) -> Option<u32> {
        self.state.lock().host_baud
    }

    /// All bytes written by the host so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.clone()
    }

    /// Written bytes as lossy UTF-8, handy for assertions.
    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().write_log).into_owned()
    }

    /// Baud rates the host switched to, in order.
    pub fn baud_changes(&self) -> Vec<u32> {
        self.state.lock().baud_log.clone()
    }

    /// Delays requested by the host, in order.
    pub fn delays(&self) -> Vec<u64> {
        self.state.lock().delay_log.clone()
    }

    /// Number of `read_byte` polls made by the host.
    pub fn read_polls(&self) -> usize {
        self.state.lock().read_polls
    }

    /// Number of bytes still waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Forget all recorded traffic but keep scripts and line rates.
    pub fn clear_logs(&mut self) {
        let mut state = self.state.lock();
        state.write_log.clear();
        state.baud_log.clear();
        state.delay_log.clear();
        state.read_polls = 0;
    }
}

impl MockDeviceState {
    fn line_matches(&self) -> bool {
        self.host_baud.map_or(true, |baud| baud == self.device_baud)
    }
}

impl AtTransport for MockAtDevice {
    fn write_byte(&mut self, byte: u8) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.write_log.push(byte);

        // Bytes sent at the wrong rate arrive as noise
        if !state.line_matches() {
            return Ok(());
        }

        state.pending.push(byte);
        let matched = state
            .scripts
            .iter()
            .find(|s| state.pending.ends_with(&s.request))
            .map(|s| s.response.clone());

        if let Some(response) = matched {
            state.pending.clear();
            state.read_queue.extend(response);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        let mut state = self.state.lock();
        state.read_polls += 1;
        Ok(state.read_queue.pop_front())
    }

    fn delay_ms(&mut self, ms: u64) -> Result<(), PortError> {
        self.state.lock().delay_log.push(ms);
        Ok(())
    }

    fn set_baud(&mut self, baud: u32) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.host_baud = Some(baud);
        state.baud_log.push(baud);
        state.pending.clear();
        Ok(())
    }
}

impl std::fmt::Debug for MockAtDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockAtDevice")
            .field("device_baud", &state.device_baud)
            .field("host_baud", &state.host_baud)
            .field("available_bytes", &state.read_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(device: &mut MockAtDevice, bytes: &[u8]) {
        for b in bytes {
            device.write_byte(*b).unwrap();
        }
    }

    fn drain(device: &mut MockAtDevice) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = device.read_byte().unwrap() {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_scripted_response() {
        let mut device = MockAtDevice::new(9600);
        device.respond(b"---", b"END\r\n");

        send(&mut device, b"---");
        assert_eq!(drain(&mut device), b"END\r\n");
    }

    #[test]
    fn test_no_response_at_wrong_baud() {
        let mut device = MockAtDevice::new(9600);
        device.respond(b"$$$", b"CMD\r\n");

        device.set_baud(1200).unwrap();
        send(&mut device, b"$$$");
        assert_eq!(device.available_bytes(), 0);

        device.set_baud(9600).unwrap();
        send(&mut device, b"$$$");
        assert_eq!(drain(&mut device), b"CMD\r\n");
        assert_eq!(device.baud_changes(), vec![1200, 9600]);
    }

    #[test]
    fn test_request_after_noise_still_matches() {
        let mut device = MockAtDevice::new(115200);
        device.respond(b"SU,96\r\n", b"AOK\r\n");

        send(&mut device, b"garbage");
        send(&mut device, b"SU,96\r\n");
        assert_eq!(drain(&mut device), b"AOK\r\n");
    }

    #[test]
    fn test_logs_and_clear() {
        let mut device = MockAtDevice::new(9600);
        send(&mut device, b"abc");
        device.delay_ms(50).unwrap();
        let _ = device.read_byte().unwrap();

        assert_eq!(device.written_string(), "abc");
        assert_eq!(device.delays(), vec![50]);
        assert_eq!(device.read_polls(), 1);

        device.clear_logs();
        assert!(device.written().is_empty());
        assert!(device.delays().is_empty());
        assert_eq!(device.read_polls(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let mut device = MockAtDevice::new(9600);
        let observer = device.clone();
        send(&mut device, b"x");
        assert_eq!(observer.written(), b"x");
    }
}
