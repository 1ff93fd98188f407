//! Hardware family definitions.
//!
//! Each hardware revision ships with its own compiled-in AES key and probe
//! layout. The family is selected by configuration, not by probing the
//! device, and everything revision-specific hangs off this one enum.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::cipher::KEY_LEN;
use crate::ble::uuids::PROBE_TEMPERATURE_UUIDS;
use crate::error::Error;

// Family keys. These are pairing constants baked into the vendor firmware
// and apps, identical for every unit of a revision, not secrets material.
const MINI_KEY: [u8; KEY_LEN] = [
    0xed, 0x5e, 0x30, 0x8e, 0x8b, 0xcc, 0x91, 0x13, 0x30, 0x6c, 0xd4, 0x68, 0x54, 0x15, 0x3e,
    0xdd,
];
const V2_KEY: [u8; KEY_LEN] = [
    0xdf, 0x33, 0xe0, 0x89, 0xf4, 0x48, 0x4e, 0x73, 0x92, 0xd4, 0xcf, 0xb9, 0x46, 0xe7, 0x85,
    0xb6,
];
const V3_KEY: [u8; KEY_LEN] = [
    0x27, 0x62, 0xfc, 0x5e, 0xca, 0x13, 0x45, 0xe5, 0x9d, 0x11, 0xde, 0x4a, 0xf6, 0xf3, 0x8c,
    0x1c,
];
const PULSE_2000_KEY: [u8; KEY_LEN] = [
    0xab, 0x4a, 0x2d, 0x9f, 0x11, 0x67, 0xce, 0x70, 0x3c, 0x5a, 0xe2, 0x18, 0x84, 0xf0, 0x2b,
    0x96,
];

/// A hardware revision of the iGrill line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DeviceFamily {
    /// iGrill Mini: single probe.
    #[serde(rename = "igrill_mini")]
    Mini,
    /// iGrill v2: four probes.
    #[serde(rename = "igrill_v2")]
    V2,
    /// iGrill v3: four probes.
    #[serde(rename = "igrill_v3")]
    V3,
    /// Weber Pulse 2000: four probes plus heating elements.
    #[serde(rename = "pulse_2000")]
    Pulse2000,
}

impl DeviceFamily {
    /// The largest probe count any family exposes.
    pub const MAX_PROBES: usize = 4;

    /// The AES-128 key for this family. Fixed per revision; never varies
    /// per unit.
    pub fn key(&self) -> [u8; KEY_LEN] {
        match self {
            Self::Mini => MINI_KEY,
            Self::V2 => V2_KEY,
            Self::V3 => V3_KEY,
            Self::Pulse2000 => PULSE_2000_KEY,
        }
    }

    /// Number of physical probe slots on this family.
    pub fn probe_count(&self) -> usize {
        match self {
            Self::Mini => 1,
            Self::V2 | Self::V3 | Self::Pulse2000 => 4,
        }
    }

    /// The temperature characteristic for a probe slot (1-based), or `None`
    /// for slots this family does not have.
    pub fn probe_characteristic(&self, probe: usize) -> Option<Uuid> {
        if probe == 0 || probe > self.probe_count() {
            return None;
        }
        Some(PROBE_TEMPERATURE_UUIDS[probe - 1])
    }

    /// Whether this family exposes a heating-element characteristic.
    pub fn has_heating_element(&self) -> bool {
        matches!(self, Self::Pulse2000)
    }

    /// The tag used for this family in configuration files.
    pub fn config_tag(&self) -> &'static str {
        match self {
            Self::Mini => "igrill_mini",
            Self::V2 => "igrill_v2",
            Self::V3 => "igrill_v3",
            Self::Pulse2000 => "pulse_2000",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_tag())
    }
}

impl FromStr for DeviceFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "igrill_mini" => Ok(Self::Mini),
            "igrill_v2" => Ok(Self::V2),
            "igrill_v3" => Ok(Self::V3),
            "pulse_2000" => Ok(Self::Pulse2000),
            other => Err(Error::Config(format!("unknown device type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DeviceFamily; 4] = [
        DeviceFamily::Mini,
        DeviceFamily::V2,
        DeviceFamily::V3,
        DeviceFamily::Pulse2000,
    ];

    #[test]
    fn test_probe_counts() {
        assert_eq!(DeviceFamily::Mini.probe_count(), 1);
        assert_eq!(DeviceFamily::V2.probe_count(), 4);
        assert_eq!(DeviceFamily::V3.probe_count(), 4);
        assert_eq!(DeviceFamily::Pulse2000.probe_count(), 4);
    }

    #[test]
    fn test_probe_characteristic_bounds() {
        for family in ALL {
            assert!(family.probe_characteristic(0).is_none());
            assert!(family.probe_characteristic(1).is_some());
            assert!(family
                .probe_characteristic(DeviceFamily::MAX_PROBES + 1)
                .is_none());
        }

        // A 1-probe family has no slots past the first.
        assert!(DeviceFamily::Mini.probe_characteristic(2).is_none());
        assert!(DeviceFamily::Mini.probe_characteristic(4).is_none());
        assert!(DeviceFamily::V2.probe_characteristic(4).is_some());
    }

    #[test]
    fn test_keys_are_distinct_per_family() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.key(), b.key());
            }
        }
    }

    #[test]
    fn test_heating_element_support() {
        assert!(DeviceFamily::Pulse2000.has_heating_element());
        assert!(!DeviceFamily::Mini.has_heating_element());
        assert!(!DeviceFamily::V2.has_heating_element());
        assert!(!DeviceFamily::V3.has_heating_element());
    }

    #[test]
    fn test_config_tag_roundtrip() {
        for family in ALL {
            assert_eq!(family.config_tag().parse::<DeviceFamily>().unwrap(), family);
        }
        assert!("igrill_v4".parse::<DeviceFamily>().is_err());
    }
}
