//! Configuration loading and validation.
//!
//! The monitor is driven by one TOML file: a `[mqtt]` section for the bus
//! connection and a `[[devices]]` table per thermometer. Everything is
//! validated here, once, at startup; the rest of the crate only ever sees
//! already-checked values.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::family::DeviceFamily;
use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Message bus connection settings.
    pub mqtt: MqttSettings,
    /// The devices to monitor.
    #[serde(default)]
    pub devices: Vec<DeviceIdentity>,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttSettings {
    /// Broker hostname or IP.
    pub host: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive: u64,
    /// Client identifier presented to the broker.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Username/password authentication.
    #[serde(default)]
    pub auth: Option<MqttAuth>,
    /// TLS transport settings.
    #[serde(default)]
    pub tls: Option<MqttTls>,
}

/// Username/password credentials for the broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttAuth {
    /// Username.
    pub username: String,
    /// Password; some brokers accept username-only auth.
    #[serde(default)]
    pub password: Option<String>,
}

/// TLS settings for the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttTls {
    /// CA certificate bundle to trust. Falls back to an empty trust store
    /// when unset, which only works with brokers presenting certificates
    /// from the system roots compiled into the TLS backend.
    #[serde(default)]
    pub ca_certs: Option<PathBuf>,
}

/// One configured thermometer. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceIdentity {
    /// Display name; also the second segment of every published topic.
    pub name: String,
    /// Hardware family.
    #[serde(rename = "type")]
    pub family: DeviceFamily,
    /// Link-layer address, e.g. `AA:BB:CC:DD:EE:FF`.
    pub address: String,
    /// Base topic readings are published under.
    pub topic: String,
    /// Seconds between polls; also the retry delay after a failure.
    pub interval: u64,
}

impl DeviceIdentity {
    /// The polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

fn default_port() -> u16 {
    1883
}

fn default_keepalive() -> u64 {
    60
}

fn default_client_id() -> String {
    "igrill-mqtt".to_string()
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mqtt.client_id.is_empty() {
            return Err(Error::Config("mqtt client_id must not be empty".to_string()));
        }
        // The MQTT client refuses keep-alives under 5 seconds.
        if self.mqtt.keepalive < 5 {
            return Err(Error::Config(format!(
                "mqtt keepalive must be at least 5 seconds, got {}",
                self.mqtt.keepalive
            )));
        }

        if self.devices.is_empty() {
            return Err(Error::Config("no devices configured".to_string()));
        }

        let mut names = HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(Error::Config("device with empty name".to_string()));
            }
            if !names.insert(device.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate device name '{}'",
                    device.name
                )));
            }
            if device.address.is_empty() {
                return Err(Error::Config(format!(
                    "device '{}' has an empty address",
                    device.name
                )));
            }
            if device.topic.is_empty() {
                return Err(Error::Config(format!(
                    "device '{}' has an empty topic",
                    device.name
                )));
            }
            if device.interval == 0 {
                return Err(Error::Config(format!(
                    "device '{}' has a zero polling interval",
                    device.name
                )));
            }
        }

        Ok(())
    }
}
