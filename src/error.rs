//! Error types for the igrill-mqtt crate.

use thiserror::Error;

/// The main error type for this crate.
///
/// Every kind except [`Error::Config`] is recovered locally by the owning
/// polling supervisor: the session is closed, the worker sleeps for the
/// configured interval, and the whole connect-and-authenticate sequence is
/// redone. Nothing propagates across devices.
#[derive(Error, Debug)]
pub enum Error {
    /// Link establishment or security negotiation failed.
    #[error("connection failed: {reason}")]
    Connection {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The challenge-response handshake failed.
    ///
    /// Covers both a challenge mismatch and any transport failure during the
    /// handshake, so callers have a single failure kind for the whole
    /// authentication exchange.
    #[error("authentication failed: {reason}")]
    Auth {
        /// Description of what went wrong during the handshake.
        reason: String,
    },

    /// A characteristic read failed outside the handshake.
    #[error("characteristic read failed: {reason}")]
    Read {
        /// Description of the read failure.
        reason: String,
    },

    /// A characteristic write failed outside the handshake.
    #[error("characteristic write failed: {reason}")]
    Write {
        /// Description of the write failure.
        reason: String,
    },

    /// Characteristic not found on the device.
    #[error("characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// The message bus client refused a publish.
    #[error("publish failed: {reason}")]
    Publish {
        /// Description of the publish failure.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Auth {
            reason: "device challenge did not echo our nonce".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authentication failed: device challenge did not echo our nonce"
        );

        let err = Error::CharacteristicNotFound {
            uuid: "2a19".to_string(),
        };
        assert_eq!(err.to_string(), "characteristic not found: 2a19");
    }
}
