//! Device families and sensor profiles.

pub mod family;
pub mod profile;

pub use family::DeviceFamily;
pub use profile::{decode_probe_raw, DeviceProfile, SensorSnapshot, PROBE_ABSENT_RAW};
