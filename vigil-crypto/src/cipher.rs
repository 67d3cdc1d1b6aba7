//! Payload encryption using ChaCha20-Poly1305.
//!
//! The AEAD output is split into nonce / ciphertext / tag so the
//! transport payload can carry each part as its own field, plus an
//! independent SHA-256 checksum over the ciphertext as a cheap
//! pre-filter before tag verification.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SyncKey;
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Size of nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// The three parts of one AEAD encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherParts {
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext, without the tag.
    pub ciphertext: Vec<u8>,
    /// The Poly1305 authentication tag.
    pub tag: [u8; TAG_SIZE],
}

/// Encrypts plaintext, generating a fresh random nonce.
pub fn encrypt(key: &SyncKey, plaintext: &[u8]) -> CryptoResult<CipherParts> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // The AEAD implementation appends the tag to the ciphertext.
    let mut combined = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let tag_start = combined.len() - TAG_SIZE;
    let tag: [u8; TAG_SIZE] = combined[tag_start..]
        .try_into()
        .map_err(|_| CryptoError::Encryption("tag split failed".to_string()))?;
    combined.truncate(tag_start);

    Ok(CipherParts {
        nonce: nonce_bytes,
        ciphertext: combined,
        tag,
    })
}

/// Decrypts previously encrypted parts.
///
/// Fails if the tag does not verify (wrong key or tampered data).
pub fn decrypt(key: &SyncKey, parts: &CipherParts) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&parts.nonce);

    let mut combined = Vec::with_capacity(parts.ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(&parts.ciphertext);
    combined.extend_from_slice(&parts.tag);

    cipher.decrypt(nonce, combined.as_ref()).map_err(|_| {
        CryptoError::Decryption("authentication failed (wrong key or tampered data)".to_string())
    })
}

/// SHA-256 hex digest over the ciphertext.
///
/// Independent of the AEAD tag; validated before decryption is attempted.
pub fn checksum(ciphertext: &[u8]) -> String {
    let digest = Sha256::digest(ciphertext);
    hex::encode(digest)
}

/// Verifies a ciphertext against its recorded checksum.
pub fn verify_checksum(ciphertext: &[u8], expected: &str) -> CryptoResult<()> {
    if checksum(ciphertext) != expected {
        return Err(CryptoError::ChecksumMismatch);
    }
    Ok(())
}
