//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::commander::CANDIDATE_BAUD_RATES;
use crate::profile::{DeviceFamily, PlatformProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Device family / profile selection
    pub device: DeviceConfig,
    /// Baud discovery settings
    pub discovery: DiscoveryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// The profile a session should use: the custom one if present,
    /// otherwise the family's, with the delay override applied.
    pub fn platform_profile(&self) -> PlatformProfile {
        let mut profile = self
            .device
            .profile
            .clone()
            .unwrap_or_else(|| self.device.family.profile());
        if let Some(delay) = self.device.response_delay_ms {
            profile.response_delay_ms = delay;
        }
        profile
    }

    /// Reject values a session cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.discovery.candidate_bauds.is_empty() {
            return Err(ConfigError::validation(
                "discovery.candidate_bauds",
                "at least one baud rate is required",
            ));
        }
        if self.discovery.candidate_bauds.contains(&0) {
            return Err(ConfigError::validation(
                "discovery.candidate_bauds",
                "baud rates must be non-zero",
            ));
        }
        if let Some(profile) = &self.device.profile {
            profile
                .validate()
                .map_err(|message| ConfigError::validation("device.profile", message))?;
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port to open (e.g. "/dev/ttyUSB0" or "COM3")
    pub port: Option<String>,
    /// How long one byte poll may block, in milliseconds
    pub read_timeout_ms: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            read_timeout_ms: 10,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the poll timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Device selection section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Built-in family to use
    pub family: DeviceFamily,
    /// Fully custom profile, overriding `family`
    pub profile: Option<PlatformProfile>,
    /// Override of the profile's settle delay
    pub response_delay_ms: Option<u64>,
}

/// Baud discovery section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Rates probed in order while looking for the device
    pub candidate_bauds: Vec<u32>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            candidate_bauds: CANDIDATE_BAUD_RATES.to_vec(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty multi-line format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::BaudMapping;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.family, DeviceFamily::Rn42);
        assert_eq!(config.discovery.candidate_bauds, CANDIDATE_BAUD_RATES);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("bluetooth".to_string(), "/dev/ttyUSB1".to_string());

        assert_eq!(config.resolve_port("bluetooth"), "/dev/ttyUSB1");
        assert_eq!(config.resolve_port("COM5"), "COM5");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[discovery]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            port = "/dev/ttyAMA0"

            [device]
            family = "xbee"
            response_delay_ms = 1200
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyAMA0"));
        let profile = config.platform_profile();
        assert_eq!(profile.name, "XBee");
        assert_eq!(profile.response_delay_ms, 1200);
        assert_eq!(profile.baud_mapping, BaudMapping::XbeeIndex);
        // Defaults should still work
        assert_eq!(config.serial.read_timeout_ms, 10);
    }

    #[test]
    fn test_custom_profile_overrides_family() {
        let toml_str = r#"
            [device]
            family = "xbee"

            [device.profile]
            name = "HC-05"
            response_delay_ms = 50
            enter_command_mode = { request = "AT\r\n", response = "OK\r\n" }
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        let profile = config.platform_profile();
        assert_eq!(profile.name, "HC-05");
        assert_eq!(profile.response_delay_ms, 50);
    }

    #[test]
    fn test_validation_rejects_empty_candidates() {
        let mut config = Config::default();
        config.discovery.candidate_bauds.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));

        config.discovery.candidate_bauds = vec![9600, 0];
        assert!(config.validate().is_err());
    }
}
