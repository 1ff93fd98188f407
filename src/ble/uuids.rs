//! BLE characteristic UUIDs.
//!
//! Contains all UUID constants used for iGrill communication. The
//! authentication triple lives in the vendor's `64ac...` service; the probe
//! temperature slots live in the `06ef...` service.

use uuid::Uuid;

// Standard BLE
/// Standard Battery Level characteristic UUID (Read).
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

// Authentication service (iDevices custom)
/// Firmware version characteristic UUID.
pub const FIRMWARE_VERSION_UUID: Uuid = Uuid::from_u128(0x64ac_0001_4a4b_4b58_9f37_94d3c52ffdf7);
/// App challenge characteristic UUID (Write), first half of the handshake.
pub const APP_CHALLENGE_UUID: Uuid = Uuid::from_u128(0x64ac_0002_4a4b_4b58_9f37_94d3c52ffdf7);
/// Device challenge characteristic UUID (Read), ciphertext from the device.
pub const DEVICE_CHALLENGE_UUID: Uuid = Uuid::from_u128(0x64ac_0003_4a4b_4b58_9f37_94d3c52ffdf7);
/// Device response characteristic UUID (Write), encrypted echo back.
pub const DEVICE_RESPONSE_UUID: Uuid = Uuid::from_u128(0x64ac_0004_4a4b_4b58_9f37_94d3c52ffdf7);

// Sensor service (iDevices custom)
/// Probe 1 temperature characteristic UUID.
pub const PROBE1_TEMPERATURE_UUID: Uuid =
    Uuid::from_u128(0x06ef_0002_2e06_4b79_9e33_fce2c42805ec);
/// Probe 2 temperature characteristic UUID.
pub const PROBE2_TEMPERATURE_UUID: Uuid =
    Uuid::from_u128(0x06ef_0004_2e06_4b79_9e33_fce2c42805ec);
/// Probe 3 temperature characteristic UUID.
pub const PROBE3_TEMPERATURE_UUID: Uuid =
    Uuid::from_u128(0x06ef_0006_2e06_4b79_9e33_fce2c42805ec);
/// Probe 4 temperature characteristic UUID.
pub const PROBE4_TEMPERATURE_UUID: Uuid =
    Uuid::from_u128(0x06ef_0008_2e06_4b79_9e33_fce2c42805ec);

/// Heating element characteristic UUID (Pulse 2000 only).
pub const HEATING_ELEMENTS_UUID: Uuid =
    Uuid::from_u128(0x6c91_0002_2e06_4b79_9e33_fce2c42805ec);

/// All probe temperature characteristics in slot order (probe 1 first).
pub const PROBE_TEMPERATURE_UUIDS: [Uuid; 4] = [
    PROBE1_TEMPERATURE_UUID,
    PROBE2_TEMPERATURE_UUID,
    PROBE3_TEMPERATURE_UUID,
    PROBE4_TEMPERATURE_UUID,
];

/// Check if a characteristic UUID belongs to the authentication service.
pub fn is_auth_characteristic(uuid: &Uuid) -> bool {
    *uuid == APP_CHALLENGE_UUID || *uuid == DEVICE_CHALLENGE_UUID || *uuid == DEVICE_RESPONSE_UUID
}
