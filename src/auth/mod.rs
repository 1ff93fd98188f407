//! Challenge-response authentication.
//!
//! Sensor characteristics on every iGrill family are gated behind a
//! symmetric-key handshake; this module holds the cipher, the per-connection
//! session state, and the handshake itself.

pub mod cipher;
pub mod handshake;
pub mod session;

pub use handshake::Authenticator;
pub use session::Session;
