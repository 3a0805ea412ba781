use std::time::Duration;

use altslave_transport::SlaveAddress;
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Default device name.
pub const DEFAULT_NAME: &str = "alt-slave";

/// Default 7-bit slave address.
pub const DEFAULT_ADDRESS: u8 = 0x3c;

/// Default wait for a complete session, in milliseconds.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Controls how a device presents itself on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Name used in logs and listings.
    pub name: String,
    /// 7-bit address the device answers on.
    pub address: u8,
    /// Default timeout for [`crate::SlaveDevice::wait_message`].
    pub wait_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            address: DEFAULT_ADDRESS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl DeviceConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Override the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the config and return the validated address.
    pub fn validate(&self) -> Result<SlaveAddress> {
        if self.name.trim().is_empty() {
            return Err(DeviceError::InvalidConfig(
                "name must not be empty".to_string(),
            ));
        }
        if self.wait_timeout_ms == 0 {
            return Err(DeviceError::InvalidConfig(
                "wait_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(SlaveAddress::new(self.address)?)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}
