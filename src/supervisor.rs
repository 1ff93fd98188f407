//! Per-device polling supervisor.
//!
//! One supervisor owns one configured device for the life of the process.
//! Each iteration opens a fresh session: connect (serialized process-wide),
//! negotiate security, enumerate characteristics, authenticate, then poll
//! and publish until something fails. Any failure tears the whole session
//! down; after sleeping the configured interval the sequence restarts from
//! the connect; authentication is never retried in isolation.
//!
//! The retry delay is deliberately flat: a one-off radio glitch and a
//! persistently wrong address are treated the same. Anyone adding backoff
//! here is changing observable behavior, not just tuning it.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::handshake::Authenticator;
use crate::auth::session::Session;
use crate::ble::link::{LinkConnector, SecurityLevel};
use crate::config::DeviceIdentity;
use crate::device::profile::DeviceProfile;
use crate::error::Result;
use crate::publish::{publish_snapshot, MessageSink};

/// Drives connect → authenticate → poll → publish for one device.
pub struct PollingSupervisor {
    identity: DeviceIdentity,
    profile: DeviceProfile,
    authenticator: Authenticator,
    connector: Arc<dyn LinkConnector>,
    sink: Arc<dyn MessageSink>,
    shutdown: watch::Receiver<bool>,
}

impl PollingSupervisor {
    /// Create a supervisor for one configured device.
    ///
    /// `shutdown` is the process-wide cancellation signal: flipping it to
    /// `true` stops every supervisor at its next check. It is polled
    /// cooperatively: a supervisor blocked in a link call will only
    /// observe it once that call returns.
    pub fn new(
        identity: DeviceIdentity,
        connector: Arc<dyn LinkConnector>,
        sink: Arc<dyn MessageSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let profile = DeviceProfile::new(identity.family);
        let authenticator = Authenticator::new(identity.family.key());

        Self {
            identity,
            profile,
            authenticator,
            connector,
            sink,
            shutdown,
        }
    }

    /// Spawn the supervisor onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled. Never returns an error: every failure is
    /// recovered locally by restarting the session after one interval.
    pub async fn run(mut self) {
        info!(
            device = %self.identity.name,
            address = %self.identity.address,
            family = %self.identity.family,
            "supervisor started"
        );

        loop {
            if self.cancelled() {
                break;
            }

            match self.session_cycle().await {
                // The only clean exit from a session is the cancellation
                // signal observed between polls.
                Ok(()) => break,
                Err(e) => {
                    warn!(
                        device = %self.identity.name,
                        error = %e,
                        "session failed, retrying in {}s",
                        self.identity.interval
                    );
                }
            }

            tokio::time::sleep(self.identity.poll_interval()).await;
        }

        info!(device = %self.identity.name, "supervisor stopped");
    }

    fn cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// One full session: connect through teardown. Returns `Ok(())` only
    /// when cancellation ended a healthy session.
    async fn session_cycle(&mut self) -> Result<()> {
        debug!(device = %self.identity.name, "connecting");

        let link = self.connector.connect(&self.identity.address).await?;
        let mut session = Session::new(link);

        let ended = self.drive(&mut session).await;

        // Every exit path releases the connection; close is idempotent.
        session.close().await;

        ended
    }

    async fn drive(&mut self, session: &mut Session) -> Result<()> {
        session.negotiate_security(SecurityLevel::Medium).await?;
        session.enumerate_characteristics().await?;

        self.authenticator.authenticate(session).await?;

        loop {
            let snapshot = self.profile.read_snapshot(session).await?;

            publish_snapshot(
                self.sink.as_ref(),
                &self.identity.topic,
                &self.identity.name,
                &snapshot,
            )
            .await?;

            debug!(
                device = %self.identity.name,
                battery = snapshot.battery(),
                "snapshot published, sleeping {}s",
                self.identity.interval
            );

            tokio::time::sleep(self.identity.poll_interval()).await;

            if self.cancelled() {
                return Ok(());
            }
        }
    }
}
