//! Command/response engine.
//!
//! One request, one settle delay, one fixed-length read, one comparison.
//! Every higher-level operation is built on [`Link::request`].

use super::link::{Link, MAX_RETRIES};
use crate::error::AtResult;
use crate::port::AtTransport;

impl<T: AtTransport> Link<T> {
    /// Send `request` verbatim and verify the device answers with exactly
    /// `expected`.
    ///
    /// The expected length decides how many bytes are read; there is no
    /// terminator search.
    pub fn request(&mut self, request: &str, expected: &str, settle_ms: u64) -> AtResult<()> {
        self.write_bytes(request.as_bytes())?;
        self.delay(settle_ms)?;

        let response = self.read_bytes(expected.len(), MAX_RETRIES)?;
        self.check_response(&response, expected.as_bytes())
    }
}
