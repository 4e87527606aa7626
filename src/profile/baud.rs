//! Baud-value encodings.
//!
//! Some modules take the literal rate in their set-baud command, others an
//! index into a table of supported rates.

use crate::error::{AtError, AtResult};
use serde::{Deserialize, Serialize};

/// The XBee `ATBD` table: rate and the code the module expects for it.
///
/// Slot 1 is 2400 baud on the module. `2300` is accepted for it as well,
/// since the legacy rate table listed the slot under that value.
const XBEE_BAUD_CODES: &[(u32, u32)] = &[
    (1200, 0),
    (2300, 1),
    (2400, 1),
    (4800, 2),
    (9600, 3),
    (19200, 4),
    (38400, 5),
    (57600, 6),
    (115200, 7),
];

/// How a requested baud rate is written into the set-baud command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaudMapping {
    /// The rate itself is the on-wire value.
    #[default]
    Passthrough,
    /// Index into the XBee rate table. Rates outside the table are rejected.
    XbeeIndex,
}

impl BaudMapping {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::XbeeIndex => "xbee_index",
        }
    }

    /// Map `baud` to the value substituted into the set-baud request.
    pub fn encode(&self, baud: u32) -> AtResult<u32> {
        match self {
            Self::Passthrough => Ok(baud),
            Self::XbeeIndex => xbee_baud_code(baud).ok_or(AtError::UnmappableBaud {
                baud,
                mapping: self.name(),
            }),
        }
    }
}

/// Look up the XBee `ATBD` code for a rate.
pub fn xbee_baud_code(baud: u32) -> Option<u32> {
    XBEE_BAUD_CODES
        .iter()
        .find(|(rate, _)| *rate == baud)
        .map(|(_, code)| *code)
}
