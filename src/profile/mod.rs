//! Platform profiles.
//!
//! A profile describes how one device family is driven: the command that
//! opens command mode, the one that closes it, how the baud rate is set and
//! stored, and how the module is rebooted. Families are a tagged enum so a
//! new module type is one more variant and one more constant, without any
//! change to the session state machine.

pub mod baud;

use crate::error::Operation;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub use baud::{xbee_baud_code, BaudMapping};

/// Placeholder substituted with the encoded baud value.
pub const PLACEHOLDER: &str = "%d";

/// Settle delay used by families that do not need anything special.
pub const DEFAULT_RESPONSE_DELAY_MS: u64 = 100;

/// A request template and the response it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Literal request, or a template containing one `%d`.
    pub request: Cow<'static, str>,
    /// Exact expected reply. `None` for commands that get no answer.
    #[serde(default)]
    pub response: Option<Cow<'static, str>>,
}

impl CommandDescriptor {
    /// A verified command.
    pub const fn new(request: &'static str, response: &'static str) -> Self {
        Self {
            request: Cow::Borrowed(request),
            response: Some(Cow::Borrowed(response)),
        }
    }

    /// A command whose reply is never read.
    pub const fn unanswered(request: &'static str) -> Self {
        Self {
            request: Cow::Borrowed(request),
            response: None,
        }
    }

    pub fn is_templated(&self) -> bool {
        self.request.contains(PLACEHOLDER)
    }

    /// The request with `value` written into its placeholder. Literal
    /// requests are returned unchanged.
    pub fn render(&self, value: u32) -> String {
        self.request.replacen(PLACEHOLDER, &value.to_string(), 1)
    }

    pub fn expected_response(&self) -> Option<&str> {
        self.response.as_deref()
    }
}

/// Immutable description of one device family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Human-readable family name.
    pub name: Cow<'static, str>,
    /// Pause between sending a request and reading its reply.
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,
    #[serde(default)]
    pub baud_mapping: BaudMapping,
    pub enter_command_mode: CommandDescriptor,
    #[serde(default)]
    pub exit_command_mode: Option<CommandDescriptor>,
    #[serde(default)]
    pub set_baud_rate: Option<CommandDescriptor>,
    #[serde(default)]
    pub store_settings: Option<CommandDescriptor>,
    #[serde(default)]
    pub reboot: Option<CommandDescriptor>,
}

fn default_response_delay_ms() -> u64 {
    DEFAULT_RESPONSE_DELAY_MS
}

impl PlatformProfile {
    /// The descriptor for `op`, if this family supports it.
    pub fn descriptor(&self, op: Operation) -> Option<&CommandDescriptor> {
        match op {
            Operation::EnterCommandMode => Some(&self.enter_command_mode),
            Operation::ExitCommandMode => self.exit_command_mode.as_ref(),
            Operation::SetBaudRate => self.set_baud_rate.as_ref(),
            Operation::StoreSettings => self.store_settings.as_ref(),
            Operation::Reboot => self.reboot.as_ref(),
        }
    }

    pub fn supports(&self, op: Operation) -> bool {
        self.descriptor(op).is_some()
    }

    /// Check the profile is usable. Returns a message naming the problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.enter_command_mode.request.is_empty() {
            return Err("enter_command_mode request is empty".to_string());
        }
        if self.enter_command_mode.response.is_none() {
            return Err("enter_command_mode needs an expected response".to_string());
        }
        if let Some(set) = &self.set_baud_rate {
            if !set.is_templated() {
                return Err(format!(
                    "set_baud_rate request {:?} has no {} placeholder",
                    set.request, PLACEHOLDER
                ));
            }
        }
        Ok(())
    }
}

/// Roving Networks RN-41/RN-42 Bluetooth modules.
pub const RN42: PlatformProfile = PlatformProfile {
    name: Cow::Borrowed("RN-42"),
    response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
    baud_mapping: BaudMapping::Passthrough,
    enter_command_mode: CommandDescriptor::new("$$$", "CMD\r\n"),
    exit_command_mode: Some(CommandDescriptor::new("---", "END\r\n")),
    set_baud_rate: Some(CommandDescriptor::new("SU,%d\r\n", "AOK\r\n")),
    // Settings persist on their own
    store_settings: None,
    reboot: Some(CommandDescriptor::unanswered("R,1\r\n")),
};

/// Digi XBee radios.
pub const XBEE: PlatformProfile = PlatformProfile {
    name: Cow::Borrowed("XBee"),
    response_delay_ms: 3000,
    baud_mapping: BaudMapping::XbeeIndex,
    enter_command_mode: CommandDescriptor::new("+++", "OK"),
    // Command mode times out by itself
    exit_command_mode: None,
    set_baud_rate: Some(CommandDescriptor::new("ATBD %d\r\n", "OK\r\n")),
    store_settings: Some(CommandDescriptor::new("ATWR\r\n", "OK\r\n")),
    reboot: None,
};

/// Built-in device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    #[default]
    Rn42,
    Xbee,
}

impl DeviceFamily {
    pub const ALL: &'static [DeviceFamily] = &[DeviceFamily::Rn42, DeviceFamily::Xbee];

    pub fn profile(self) -> PlatformProfile {
        match self {
            Self::Rn42 => RN42,
            Self::Xbee => XBEE,
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rn42 => f.write_str("rn42"),
            Self::Xbee => f.write_str("xbee"),
        }
    }
}

impl FromStr for DeviceFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "rn42" | "rn41" => Ok(Self::Rn42),
            "xbee" => Ok(Self::Xbee),
            other => Err(format!("unknown device family '{}'", other)),
        }
    }
}
