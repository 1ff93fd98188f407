//! BLE link management.
//!
//! Owns a single physical connection to one iGrill and exposes raw
//! characteristic I/O to the layers above. The [`SensorLink`] and
//! [`LinkConnector`] traits form the seam between the handshake/polling
//! logic and `btleplug`, so everything above this module can run against a
//! scripted stub.

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Serializes connection establishment process-wide.
///
/// Host radio controllers do not safely support concurrent connection setup,
/// so only one `connect` may be in flight at a time across all devices. The
/// lock is held for the duration of the connect call only, never while a
/// session is polling.
static CONNECT_LOCK: Mutex<()> = Mutex::const_new(());

/// Link security tier required before bonded characteristics are accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityLevel {
    /// No encryption.
    Low,
    /// Encrypted link. Required by every iGrill family before the sensor
    /// characteristics will answer.
    #[default]
    Medium,
    /// Encrypted and authenticated (MITM-protected) link.
    High,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Raw characteristic I/O over one wireless connection.
///
/// Implementations must keep `close` idempotent; the supervisor calls it on
/// every teardown path.
#[async_trait::async_trait]
pub trait SensorLink: Send + Sync {
    /// Raise the link security tier.
    async fn negotiate_security(&self, level: SecurityLevel) -> Result<()>;

    /// Enumerate all characteristic handles. Called once per session.
    async fn enumerate_characteristics(&self) -> Result<BTreeSet<Uuid>>;

    /// Read the current value of a characteristic.
    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>>;

    /// Write to a characteristic, optionally requesting a write
    /// acknowledgment from the device.
    async fn write(&self, characteristic: Uuid, payload: &[u8], with_response: bool)
        -> Result<()>;

    /// Release the connection. Safe to call multiple times.
    async fn close(&self);
}

/// Produces an open [`SensorLink`] for a link-layer address.
#[async_trait::async_trait]
pub trait LinkConnector: Send + Sync {
    /// Establish a connection to the device at `address`.
    async fn connect(&self, address: &str) -> Result<Box<dyn SensorLink>>;
}

/// [`SensorLink`] implementation on a `btleplug` peripheral.
pub struct BleLink {
    /// The connected peripheral.
    peripheral: Peripheral,
    /// Cached characteristics by UUID, filled by `enumerate_characteristics`.
    characteristics: RwLock<HashMap<Uuid, Characteristic>>,
    /// Set once the connection has been released.
    closed: AtomicBool,
}

impl BleLink {
    fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(&uuid)
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl SensorLink for BleLink {
    async fn negotiate_security(&self, level: SecurityLevel) -> Result<()> {
        // btleplug exposes no explicit security-level API: the encryption
        // upgrade is performed by the platform against its bonding database,
        // and the bond must already exist (on BlueZ, created with
        // bluetoothctl). Verify the link survived it.
        let up = self
            .peripheral
            .is_connected()
            .await
            .map_err(connection_err)?;

        if !up {
            return Err(Error::Connection {
                reason: format!("link dropped during {level} security negotiation"),
            });
        }

        debug!(%level, "security negotiation delegated to platform bond");
        Ok(())
    }

    async fn enumerate_characteristics(&self) -> Result<BTreeSet<Uuid>> {
        let services = self.peripheral.services();

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in services {
            for characteristic in service.characteristics {
                debug!(
                    "found characteristic {} in service {}",
                    characteristic.uuid, service.uuid
                );
                chars.insert(characteristic.uuid, characteristic);
            }
        }

        debug!("enumerated {} characteristics", chars.len());

        Ok(chars.keys().copied().collect())
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>> {
        let handle = self.characteristic(characteristic)?;

        let data = self
            .peripheral
            .read(&handle)
            .await
            .map_err(|e| Error::Read {
                reason: format!("{characteristic}: {e}"),
            })?;

        Ok(data)
    }

    async fn write(
        &self,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<()> {
        let handle = self.characteristic(characteristic)?;

        let write_type = if with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral
            .write(&handle, payload, write_type)
            .await
            .map_err(|e| Error::Write {
                reason: format!("{characteristic}: {e}"),
            })?;

        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.peripheral.disconnect().await {
            warn!("disconnect failed: {e}");
        }
    }
}

/// [`LinkConnector`] implementation on the host's first BLE adapter.
pub struct BleConnector {
    adapter: Adapter,
    /// How long to scan for a configured address that is not yet in the
    /// adapter's peripheral cache.
    scan_timeout: Duration,
}

impl BleConnector {
    /// Default time to wait for a configured address to appear.
    pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a connector on the first available adapter.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await.map_err(connection_err)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(connection_err)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Connection {
                reason: "no Bluetooth adapter available".to_string(),
            })?;

        Ok(Self {
            adapter,
            scan_timeout: Self::DEFAULT_SCAN_TIMEOUT,
        })
    }

    /// Override the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    async fn find_cached(&self, address: &str) -> Result<Option<Peripheral>> {
        let peripherals = self.adapter.peripherals().await.map_err(connection_err)?;

        Ok(peripherals
            .into_iter()
            .find(|p| p.address().to_string().eq_ignore_ascii_case(address)))
    }

    /// Locate the peripheral for `address`, scanning briefly if the adapter
    /// has not seen it yet.
    async fn locate(&self, address: &str) -> Result<Peripheral> {
        if let Some(p) = self.find_cached(address).await? {
            return Ok(p);
        }

        debug!(%address, "not in adapter cache, scanning");

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(connection_err)?;

        let deadline = Instant::now() + self.scan_timeout;
        let found = loop {
            tokio::time::sleep(Duration::from_millis(500)).await;

            if let Some(p) = self.find_cached(address).await? {
                break Some(p);
            }
            if Instant::now() >= deadline {
                break None;
            }
        };

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("stop_scan failed: {e}");
        }

        found.ok_or_else(|| Error::Connection {
            reason: format!("device {address} not found within {:?}", self.scan_timeout),
        })
    }
}

#[async_trait::async_trait]
impl LinkConnector for BleConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn SensorLink>> {
        // Only one connection attempt in flight process-wide.
        let _serialized = CONNECT_LOCK.lock().await;
        debug!(%address, "connect lock acquired");

        let peripheral = self.locate(address).await?;

        peripheral.connect().await.map_err(|e| Error::Connection {
            reason: format!("{address}: {e}"),
        })?;

        peripheral
            .discover_services()
            .await
            .map_err(connection_err)?;

        info!(%address, "connected");

        Ok(Box::new(BleLink::new(peripheral)))
    }
}

fn connection_err(e: btleplug::Error) -> Error {
    Error::Connection {
        reason: e.to_string(),
    }
}
