//! BLE communication module.
//!
//! This module provides low-level Bluetooth Low Energy functionality
//! for connecting to and exchanging characteristic data with iGrill
//! thermometers.

pub mod link;
pub mod uuids;

pub use link::{BleConnector, BleLink, LinkConnector, SecurityLevel, SensorLink};
pub use uuids::*;
