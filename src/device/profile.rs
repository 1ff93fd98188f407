//! Sensor reading and decoding.
//!
//! A [`DeviceProfile`] turns raw characteristic bytes from an authenticated
//! session into a [`SensorSnapshot`]. Readings come back in device units;
//! no scaling is applied here.

use tracing::trace;
use uuid::Uuid;

use crate::auth::session::Session;
use crate::ble::uuids::{BATTERY_LEVEL_UUID, HEATING_ELEMENTS_UUID};
use crate::device::family::DeviceFamily;
use crate::error::{Error, Result};

/// Raw 16-bit value a probe characteristic reports when no physical probe
/// is attached to the slot.
///
/// The vendor firmware uses this exact decimal value; it is not a round
/// hexadecimal boundary, so do not be tempted to "correct" it.
pub const PROBE_ABSENT_RAW: u16 = 63536;

/// Decode a raw probe register into a reading, treating the absent-probe
/// sentinel as `None`.
pub fn decode_probe_raw(raw: u16) -> Option<u16> {
    if raw == PROBE_ABSENT_RAW {
        None
    } else {
        Some(raw)
    }
}

/// The result of one poll: per-probe readings, battery, and (on families
/// that have one) the heating element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSnapshot {
    probes: [Option<u16>; DeviceFamily::MAX_PROBES],
    battery: u8,
    heating_element: Option<u16>,
}

impl SensorSnapshot {
    /// Assemble a snapshot from decoded values.
    pub fn new(
        probes: [Option<u16>; DeviceFamily::MAX_PROBES],
        battery: u8,
        heating_element: Option<u16>,
    ) -> Self {
        Self {
            probes,
            battery,
            heating_element,
        }
    }

    /// The reading for a probe slot (1-based). `None` means no probe
    /// attached, or a slot this device does not have.
    pub fn probe(&self, probe: usize) -> Option<u16> {
        if probe == 0 || probe > DeviceFamily::MAX_PROBES {
            return None;
        }
        self.probes[probe - 1]
    }

    /// Iterate over `(slot, reading)` for the probes that are present.
    pub fn present_probes(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.probes
            .iter()
            .enumerate()
            .filter_map(|(i, reading)| reading.map(|r| (i + 1, r)))
    }

    /// Battery percentage (0–100).
    pub fn battery(&self) -> u8 {
        self.battery
    }

    /// Heating element reading, when the family has one.
    pub fn heating_element(&self) -> Option<u16> {
        self.heating_element
    }
}

/// Reads and decodes the sensors of one device family.
pub struct DeviceProfile {
    family: DeviceFamily,
}

impl DeviceProfile {
    /// Create a profile for a family.
    pub fn new(family: DeviceFamily) -> Self {
        Self { family }
    }

    /// The family this profile decodes for.
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Number of probe slots this profile will read.
    pub fn probe_count(&self) -> usize {
        self.family.probe_count()
    }

    /// Read every probe slot the family has. Slots beyond the family's
    /// probe count are always absent, regardless of what is on the wire.
    pub async fn read_temperatures(
        &self,
        session: &Session,
    ) -> Result<[Option<u16>; DeviceFamily::MAX_PROBES]> {
        let mut probes = [None; DeviceFamily::MAX_PROBES];

        for slot in 1..=self.family.probe_count() {
            let Some(characteristic) = self.family.probe_characteristic(slot) else {
                continue;
            };

            let raw = self.read_u16(session, characteristic).await?;
            trace!(slot, raw, "probe register");
            probes[slot - 1] = decode_probe_raw(raw);
        }

        Ok(probes)
    }

    /// Read the battery percentage.
    pub async fn read_battery(&self, session: &Session) -> Result<u8> {
        let data = session.read_sensor(BATTERY_LEVEL_UUID).await?;

        data.first().copied().ok_or_else(|| Error::Read {
            reason: "battery characteristic returned no bytes".to_string(),
        })
    }

    /// Read the heating element, on families that have one.
    pub async fn read_heating_element(&self, session: &Session) -> Result<Option<u16>> {
        if !self.family.has_heating_element() {
            return Ok(None);
        }

        Ok(Some(self.read_u16(session, HEATING_ELEMENTS_UUID).await?))
    }

    /// Read one full snapshot: temperatures, battery, heating element.
    pub async fn read_snapshot(&self, session: &Session) -> Result<SensorSnapshot> {
        let probes = self.read_temperatures(session).await?;
        let battery = self.read_battery(session).await?;
        let heating_element = self.read_heating_element(session).await?;

        Ok(SensorSnapshot::new(probes, battery, heating_element))
    }

    /// One two-byte read composed little-endian.
    ///
    /// The registers are documented byte-addressable and could be read one
    /// byte at a time, but the device updates them between reads; a single
    /// read of both bytes avoids tearing.
    async fn read_u16(&self, session: &Session, characteristic: Uuid) -> Result<u16> {
        let data = session.read_sensor(characteristic).await?;

        if data.len() < 2 {
            return Err(Error::Read {
                reason: format!(
                    "{characteristic}: short read ({} of 2 bytes)",
                    data.len()
                ),
            });
        }

        Ok(u16::from_le_bytes([data[0], data[1]]))
    }
}
