//! The vendor challenge-response handshake.
//!
//! Every iGrill refuses sensor reads until the app proves possession of the
//! family key:
//!
//! 1. App writes a 16-byte challenge (8 random bytes + 8 zero bytes).
//! 2. Device answers with 16 bytes of ciphertext on its challenge
//!    characteristic; decrypting with the family key must reproduce the
//!    app's 8 nonce bytes in the first half.
//! 3. App echoes the second half of the decrypted device challenge back,
//!    zero-prefixed and re-encrypted, on the response characteristic.
//!
//! Any transport failure inside the exchange surfaces as [`Error::Auth`] so
//! callers have a single failure kind for the whole handshake.

use rand::RngCore;
use tracing::{debug, info};

use crate::auth::cipher::{decrypt_block, encrypt_block, BLOCK_LEN, KEY_LEN};
use crate::auth::session::Session;
use crate::ble::uuids::{APP_CHALLENGE_UUID, DEVICE_CHALLENGE_UUID, DEVICE_RESPONSE_UUID};
use crate::error::{Error, Result};

/// Length of the random half of the app challenge.
pub const NONCE_LEN: usize = 8;

/// Performs the challenge-response handshake for one device family.
pub struct Authenticator {
    key: [u8; KEY_LEN],
}

impl Authenticator {
    /// Create an authenticator for the given family key.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Run the handshake on an open session, marking it authenticated on
    /// success.
    pub async fn authenticate(&self, session: &mut Session) -> Result<()> {
        // The nonce's job is liveness/replay resistance, not secrecy: a
        // predictable value would still force the device to prove it holds
        // the key. thread_rng is already more than the protocol needs.
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        self.handshake(session, nonce).await
    }

    /// Handshake with an explicit nonce. Split out so tests can drive the
    /// exchange deterministically.
    async fn handshake(&self, session: &mut Session, nonce: [u8; NONCE_LEN]) -> Result<()> {
        debug!("authenticating");

        let mut challenge = [0u8; BLOCK_LEN];
        challenge[..NONCE_LEN].copy_from_slice(&nonce);

        session
            .link()
            .write(APP_CHALLENGE_UUID, &challenge, true)
            .await
            .map_err(auth_err)?;

        let raw = session
            .link()
            .read(DEVICE_CHALLENGE_UUID)
            .await
            .map_err(auth_err)?;

        let ciphertext: [u8; BLOCK_LEN] =
            raw.as_slice().try_into().map_err(|_| Error::Auth {
                reason: format!(
                    "device challenge was {} bytes, expected {BLOCK_LEN}",
                    raw.len()
                ),
            })?;

        let device_challenge = decrypt_block(&self.key, &ciphertext);

        if device_challenge[..NONCE_LEN] != challenge[..NONCE_LEN] {
            return Err(Error::Auth {
                reason: "device challenge did not echo our nonce".to_string(),
            });
        }

        // Echo the device's own second half back, zero-prefixed.
        let mut response = [0u8; BLOCK_LEN];
        response[NONCE_LEN..].copy_from_slice(&device_challenge[NONCE_LEN..]);

        session
            .link()
            .write(DEVICE_RESPONSE_UUID, &encrypt_block(&self.key, &response), true)
            .await
            .map_err(auth_err)?;

        session.mark_authenticated();
        info!("authenticated");

        Ok(())
    }
}

/// Collapse transport failures inside the handshake into the one auth
/// failure kind.
fn auth_err(e: Error) -> Error {
    match e {
        Error::Auth { .. } => e,
        other => Error::Auth {
            reason: other.to_string(),
        },
    }
}
