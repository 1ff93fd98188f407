//! Symmetric block cipher for the handshake.
//!
//! The iGrill challenge and response are each exactly one AES block, and the
//! same 16-byte family key is used in both directions, so the whole exchange
//! reduces to single-block AES-128 operations.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

/// Length of a family key in bytes.
pub const KEY_LEN: usize = 16;

/// Length of a challenge/response block in bytes.
pub const BLOCK_LEN: usize = 16;

/// Encrypt one block with the family key.
pub fn encrypt_block(key: &[u8; KEY_LEN], plaintext: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut block = GenericArray::clone_from_slice(plaintext);
    cipher.encrypt_block(&mut block);
    block.into()
}

/// Decrypt one block with the family key.
pub fn decrypt_block(key: &[u8; KEY_LEN], ciphertext: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut block = GenericArray::clone_from_slice(ciphertext);
    cipher.decrypt_block(&mut block);
    block.into()
}
