//! Shared test utilities for atcommander integration tests.
//!
//! Builders for mock devices pre-programmed with the replies of the
//! built-in device families.

#![allow(dead_code)]

use atcommander::{AtCommander, MockAtDevice, RecordingSink, RN42, XBEE};

/// An RN-42 listening at `baud` that answers enter and exit.
pub fn rn42_device(baud: u32) -> MockAtDevice {
    let mut device = MockAtDevice::new(baud);
    device
        .respond(b"$$$", b"CMD\r\n")
        .respond(b"---", b"END\r\n");
    device
}

/// An XBee listening at `baud` that answers `+++` and `ATWR`.
pub fn xbee_device(baud: u32) -> MockAtDevice {
    let mut device = MockAtDevice::new(baud);
    device
        .respond(b"+++", b"OK")
        .respond(b"ATWR\r\n", b"OK\r\n");
    device
}

/// An RN-42 session over `device` with a recording sink attached.
pub fn rn42_session(device: &MockAtDevice) -> (AtCommander<MockAtDevice>, RecordingSink) {
    let sink = RecordingSink::new();
    let session = AtCommander::new(device.clone(), RN42).with_diagnostics(sink.clone());
    (session, sink)
}

/// An XBee session over `device` with a recording sink attached.
pub fn xbee_session(device: &MockAtDevice) -> (AtCommander<MockAtDevice>, RecordingSink) {
    let sink = RecordingSink::new();
    let session = AtCommander::new(device.clone(), XBEE).with_diagnostics(sink.clone());
    (session, sink)
}
