// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # igrill-mqtt
//!
//! A Rust service for monitoring iDevices iGrill grill thermometers over
//! Bluetooth Low Energy and republishing their readings to MQTT.
//!
//! Every iGrill gates its sensor characteristics behind a vendor
//! challenge-response handshake keyed by hardware revision; this crate
//! implements that handshake, the per-family sensor decoding, and a
//! per-device supervisor that reconnects transparently whenever the
//! wireless link misbehaves.
//!
//! ## Features
//!
//! - **Challenge-response authentication**: the AES-128 handshake required
//!   before any sensor read, per device family
//! - **Family profiles**: iGrill Mini, v2, v3, and Weber Pulse 2000 probe
//!   layouts and decoding (including the absent-probe sentinel)
//! - **Resilient polling**: one supervisor per device, flat-interval retry,
//!   no cross-device interference
//! - **MQTT fan-out**: one topic per present probe, plus battery and
//!   heating element
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use igrill_mqtt::{
//!     BleConnector, Config, MqttSink, PollingSupervisor, Result,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load(Path::new("igrill.toml"))?;
//!
//!     let connector: Arc<dyn igrill_mqtt::LinkConnector> =
//!         Arc::new(BleConnector::new().await?);
//!     let sink = Arc::new(MqttSink::connect(&config.mqtt).await?);
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let workers: Vec<_> = config
//!         .devices
//!         .iter()
//!         .cloned()
//!         .map(|device| {
//!             PollingSupervisor::new(
//!                 device,
//!                 connector.clone(),
//!                 sink.clone(),
//!                 shutdown_rx.clone(),
//!             )
//!             .spawn()
//!         })
//!         .collect();
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     shutdown_tx.send(true).ok();
//!     for worker in workers {
//!         let _ = worker.await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### Linux
//! Requires BlueZ. iGrill devices require bonding before their secured
//! characteristics answer; create the bond once with `bluetoothctl`.
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.

// Public modules
pub mod auth;
pub mod ble;
pub mod config;
pub mod device;
pub mod error;
pub mod publish;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use auth::{Authenticator, Session};
pub use ble::{BleConnector, BleLink, LinkConnector, SecurityLevel, SensorLink};
pub use config::{Config, DeviceIdentity, MqttAuth, MqttSettings, MqttTls};
pub use device::{decode_probe_raw, DeviceFamily, DeviceProfile, SensorSnapshot, PROBE_ABSENT_RAW};
pub use error::{Error, Result};
pub use publish::{publish_snapshot, MessageSink, MqttSink};
pub use supervisor::PollingSupervisor;
