//! Shared test doubles: a scriptable link, a connector handing out
//! pre-built links, and a recording message sink.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::cipher::{encrypt_block, KEY_LEN};
use crate::ble::link::{LinkConnector, SecurityLevel, SensorLink};
use crate::ble::uuids::{APP_CHALLENGE_UUID, DEVICE_CHALLENGE_UUID};
use crate::error::{Error, Result};
use crate::publish::MessageSink;

/// One write observed by a [`StubLink`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedWrite {
    pub characteristic: Uuid,
    pub payload: Vec<u8>,
    pub with_response: bool,
}

#[derive(Default)]
struct StubState {
    /// One-shot read responses, consumed front to back.
    scripted: Mutex<HashMap<Uuid, VecDeque<Vec<u8>>>>,
    /// Repeating read values used once the script is drained.
    values: Mutex<HashMap<Uuid, Vec<u8>>>,
    writes: Mutex<Vec<RecordedWrite>>,
    reads: AtomicUsize,
    closes: AtomicUsize,
    /// 1-based index of the read call that fails; 0 disables injection.
    fail_read_at: AtomicUsize,
    /// Family key for device-side handshake emulation.
    auth_key: Mutex<Option<[u8; KEY_LEN]>>,
}

/// A scriptable [`SensorLink`]. Clones share state, so tests can keep a
/// handle for assertions after the link is boxed into a session.
#[derive(Clone, Default)]
pub(crate) struct StubLink {
    state: Arc<StubState>,
}

impl StubLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn SensorLink> {
        Box::new(self.clone())
    }

    /// Queue a one-shot read response for a characteristic.
    pub fn script_read(&self, characteristic: Uuid, bytes: Vec<u8>) {
        self.state
            .scripted
            .lock()
            .entry(characteristic)
            .or_default()
            .push_back(bytes);
    }

    /// Set a repeating read value for a characteristic.
    pub fn set_value(&self, characteristic: Uuid, bytes: Vec<u8>) {
        self.state.values.lock().insert(characteristic, bytes);
    }

    /// Make the `n`-th read on this link fail (1-based). The count includes
    /// every read, the handshake's device-challenge read included.
    pub fn fail_read_at(&self, n: usize) {
        self.state.fail_read_at.store(n, Ordering::SeqCst);
    }

    /// Emulate the device side of the handshake: a write to the
    /// app-challenge characteristic queues a ciphertext on the
    /// device-challenge characteristic that echoes the written nonce,
    /// encrypted under `key`.
    pub fn emulate_device_auth(&self, key: [u8; KEY_LEN]) {
        *self.state.auth_key.lock() = Some(key);
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.writes.lock().clone()
    }

    pub fn read_count(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SensorLink for StubLink {
    async fn negotiate_security(&self, _level: SecurityLevel) -> Result<()> {
        Ok(())
    }

    async fn enumerate_characteristics(&self) -> Result<BTreeSet<Uuid>> {
        let mut handles: BTreeSet<Uuid> = self.state.values.lock().keys().copied().collect();
        handles.extend(self.state.scripted.lock().keys().copied());
        Ok(handles)
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>> {
        let n = self.state.reads.fetch_add(1, Ordering::SeqCst) + 1;

        let fail_at = self.state.fail_read_at.load(Ordering::SeqCst);
        if fail_at != 0 && n == fail_at {
            return Err(Error::Read {
                reason: format!("injected failure on read {n}"),
            });
        }

        if let Some(queue) = self.state.scripted.lock().get_mut(&characteristic) {
            if let Some(bytes) = queue.pop_front() {
                return Ok(bytes);
            }
        }

        if let Some(bytes) = self.state.values.lock().get(&characteristic) {
            return Ok(bytes.clone());
        }

        Err(Error::Read {
            reason: format!("no scripted value for {characteristic}"),
        })
    }

    async fn write(
        &self,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<()> {
        if characteristic == APP_CHALLENGE_UUID {
            if let Some(key) = *self.state.auth_key.lock() {
                let mut plaintext = [0u8; 16];
                plaintext[..8].copy_from_slice(&payload[..8]);
                plaintext[8..].copy_from_slice(&[0xa5; 8]);
                self.script_read(DEVICE_CHALLENGE_UUID, encrypt_block(&key, &plaintext).to_vec());
            }
        }

        self.state.writes.lock().push(RecordedWrite {
            characteristic,
            payload: payload.to_vec(),
            with_response,
        });

        Ok(())
    }

    async fn close(&self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ConnectorState {
    queue: Mutex<VecDeque<StubLink>>,
    connects: AtomicUsize,
}

/// A [`LinkConnector`] handing out pre-built links in order. Once the queue
/// is empty, every connect fails.
#[derive(Clone, Default)]
pub(crate) struct StubConnector {
    state: Arc<ConnectorState>,
}

impl StubConnector {
    pub fn new(links: Vec<StubLink>) -> Self {
        Self {
            state: Arc::new(ConnectorState {
                queue: Mutex::new(links.into()),
                connects: AtomicUsize::new(0),
            }),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LinkConnector for StubConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn SensorLink>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        self.state
            .queue
            .lock()
            .pop_front()
            .map(|link| link.boxed())
            .ok_or_else(|| Error::Connection {
                reason: format!("{address}: unreachable"),
            })
    }
}

/// One message observed by a [`RecordingSink`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedMessage {
    pub topic: String,
    pub payload: String,
    /// Publish time; meaningful under the paused test clock.
    pub at: tokio::time::Instant,
}

#[derive(Default)]
struct SinkState {
    messages: Mutex<Vec<RecordedMessage>>,
}

/// A [`MessageSink`] that records everything published to it.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    state: Arc<SinkState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<RecordedMessage> {
        self.state.messages.lock().clone()
    }
}

#[async_trait::async_trait]
impl MessageSink for RecordingSink {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.state.messages.lock().push(RecordedMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }
}
