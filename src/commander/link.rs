//! Framing and retry primitives.
//!
//! There is no delimiter framing on the wire: the caller always knows how
//! many bytes a reply must have, and reads exactly that many or gives up
//! after a bounded number of empty polls.

use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::error::{AtError, AtResult};
use crate::port::{AtTransport, Capability, PortError};
use tracing::trace;

/// Pause after an empty poll before trying again.
pub const RETRY_DELAY_MS: u64 = 50;

/// Empty polls tolerated while reading one response.
pub const MAX_RETRIES: usize = 3;

/// A transport together with the session's diagnostic sink.
#[derive(Debug)]
pub struct Link<T> {
    transport: T,
    pub(crate) diagnostics: Diagnostics,
}

impl<T: AtTransport> Link<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics.set(Box::new(sink));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub(crate) fn debug(&mut self, message: &str) {
        self.diagnostics.emit(message);
    }

    /// Send every byte in order. Without a write capability this is a
    /// silent no-op.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> AtResult<()> {
        trace!("tx {:?}", String::from_utf8_lossy(bytes));
        for &byte in bytes {
            match self.transport.write_byte(byte) {
                Ok(()) => {}
                Err(PortError::Unsupported(Capability::Write)) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Wait `ms` milliseconds if the transport can, otherwise carry on.
    pub fn delay(&mut self, ms: u64) -> AtResult<()> {
        match self.transport.delay_ms(ms) {
            Ok(()) | Err(PortError::Unsupported(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read up to `max_len` bytes.
    ///
    /// Every empty poll costs one retry and a [`RETRY_DELAY_MS`] pause. The
    /// retry budget is shared by the whole read, so a slow trickle of bytes
    /// can still run out of it. Returns whatever was collected, possibly
    /// nothing.
    pub fn read_bytes(&mut self, max_len: usize, max_retries: usize) -> AtResult<Vec<u8>> {
        let mut buffer = Vec::with_capacity(max_len);
        let mut retries = 0;

        while buffer.len() < max_len && retries < max_retries {
            let polled = match self.transport.read_byte() {
                Ok(byte) => byte,
                Err(PortError::Unsupported(Capability::Read)) => None,
                Err(e) => return Err(e.into()),
            };

            match polled {
                Some(byte) => buffer.push(byte),
                None => {
                    self.delay(RETRY_DELAY_MS)?;
                    retries += 1;
                }
            }
        }

        trace!(
            "rx {:?} ({} retries)",
            String::from_utf8_lossy(&buffer),
            retries
        );
        Ok(buffer)
    }

    /// Verify a response against the expected bytes, narrating why it
    /// failed when it does.
    pub fn check_response(&mut self, actual: &[u8], expected: &[u8]) -> AtResult<()> {
        if actual == expected {
            return Ok(());
        }

        let length_error = (actual.len() != expected.len()).then(|| AtError::LengthMismatch {
            expected: expected.len(),
            received: actual.len(),
        });
        if let Some(err) = &length_error {
            self.debug(&err.to_string());
        }

        let content_error = AtError::ContentMismatch {
            expected: String::from_utf8_lossy(expected).into_owned(),
            received: String::from_utf8_lossy(actual).into_owned(),
        };
        if !actual.is_empty() {
            self.debug(&content_error.to_string());
        }

        Err(length_error.unwrap_or(content_error))
    }

    /// Boolean form of [`Link::check_response`].
    pub fn compare_response(&mut self, actual: &[u8], expected: &[u8]) -> bool {
        self.check_response(actual, expected).is_ok()
    }
}
