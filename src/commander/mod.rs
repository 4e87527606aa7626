//! AT command engine.
//!
//! Layered bottom-up: [`link`] holds the byte framing and retry primitives,
//! [`request`] adds the single request/verify round trip, and [`session`]
//! is the state machine callers drive.

pub mod link;
pub mod request;
pub mod session;

pub use link::{Link, MAX_RETRIES, RETRY_DELAY_MS};
pub use session::{AtCommander, SessionReport, SessionState, CANDIDATE_BAUD_RATES};
