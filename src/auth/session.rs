//! Per-connection session state.
//!
//! A [`Session`] is created at the start of each supervisor iteration and
//! discarded on disconnect or error, never reused across reconnects. It
//! gates sensor access on handshake success: the device answers sensor reads
//! with garbage (or not at all) before authentication, so attempting one
//! earlier is always a bug.

use std::collections::BTreeSet;
use uuid::Uuid;

use crate::ble::link::{SecurityLevel, SensorLink};
use crate::error::{Error, Result};

/// The authenticated state attached to one connection attempt.
pub struct Session {
    link: Box<dyn SensorLink>,
    authenticated: bool,
}

impl Session {
    /// Wrap a freshly connected link. The session starts unauthenticated.
    pub fn new(link: Box<dyn SensorLink>) -> Self {
        Self {
            link,
            authenticated: false,
        }
    }

    /// Whether the handshake has completed on this session.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Mark the handshake as complete. Only the authenticator does this.
    pub(crate) fn mark_authenticated(&mut self) {
        self.authenticated = true;
    }

    /// Raw link access for the handshake characteristics, which are the one
    /// set readable before authentication.
    pub(crate) fn link(&self) -> &dyn SensorLink {
        self.link.as_ref()
    }

    /// Raise the link security tier. Allowed before authentication.
    pub async fn negotiate_security(&self, level: SecurityLevel) -> Result<()> {
        self.link.negotiate_security(level).await
    }

    /// Enumerate characteristic handles. Allowed before authentication.
    pub async fn enumerate_characteristics(&self) -> Result<BTreeSet<Uuid>> {
        self.link.enumerate_characteristics().await
    }

    /// Read a sensor characteristic. Refused until the handshake succeeds.
    pub async fn read_sensor(&self, characteristic: Uuid) -> Result<Vec<u8>> {
        if !self.authenticated {
            return Err(Error::Read {
                reason: format!("sensor read of {characteristic} before authentication"),
            });
        }

        self.link.read(characteristic).await
    }

    /// Release the underlying connection. Safe to call multiple times.
    pub async fn close(&self) {
        self.link.close().await;
    }
}
