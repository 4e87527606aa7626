//! Configuration module for atcommander.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `ATCOMMANDER_CONFIG` environment variable (explicit path)
//! 2. `./atcommander.toml` (current directory)
//! 3. The platform config directory, e.g. `~/.config/atcommander/atcommander.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `ATCOMMANDER_<SECTION>_<KEY>`
//!
//! - `ATCOMMANDER_SERIAL_PORT=/dev/ttyUSB0`
//! - `ATCOMMANDER_SERIAL_READ_TIMEOUT_MS=20`
//! - `ATCOMMANDER_DEVICE_FAMILY=xbee`
//! - `ATCOMMANDER_DISCOVERY_CANDIDATE_BAUDS=9600,115200`
//! - `ATCOMMANDER_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//!
//! [device]
//! family = "rn42"
//!
//! [discovery]
//! candidate_bauds = [115200, 9600]
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, DeviceConfig, DiscoveryConfig, LogFormat, LoggingConfig, SerialConfig,
};
