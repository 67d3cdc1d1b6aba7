//! Encryption layer for Vigil sync.
//!
//! Pure functions over bytes: no network or disk I/O lives here.
//!
//! - **Key derivation**: PBKDF2-HMAC-SHA-512 from the user's master
//!   secret and a per-account salt
//! - **Cipher**: ChaCha20-Poly1305 AEAD with the nonce and tag split out
//!   for the transport payload
//! - **Checksum**: independent SHA-256 digest over the ciphertext,
//!   validated before the AEAD tag
//! - **Device identity**: random URL-safe identifier generation

mod cipher;
mod device;
mod error;
mod key;

pub use cipher::{CipherParts, NONCE_SIZE, TAG_SIZE, checksum, decrypt, encrypt, verify_checksum};
pub use device::generate_device_id;
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KdfParams, SALT_SIZE, Salt, SyncKey, derive_sync_key, generate_random_key};
