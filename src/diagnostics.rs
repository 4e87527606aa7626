//! Diagnostic narration.
//!
//! A session may carry a sink that receives one line per notable event
//! (probe attempts, response mismatches, state changes). The same lines are
//! always emitted as `tracing` debug events, so a missing sink only silences
//! the narration and never changes behaviour.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// One-line log consumer.
pub trait DiagnosticSink: Send {
    fn emit(&mut self, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&str) + Send,
{
    fn emit(&mut self, message: &str) {
        self(message)
    }
}

/// Forwards every diagnostic to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, message: &str) {
        info!(target: "atcommander::device", "{}", message);
    }
}

/// Keeps every diagnostic in a shared buffer.
///
/// Clones share the buffer, so one copy can be handed to a session while
/// another is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// True if any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// The optional sink held by a session.
#[derive(Default)]
pub(crate) struct Diagnostics {
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl Diagnostics {
    pub(crate) fn set(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = Some(sink);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub(crate) fn emit(&mut self, message: &str) {
        debug!(target: "atcommander", "{}", message);
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(message);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
