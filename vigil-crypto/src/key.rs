//! Key derivation and management.
//!
//! Derives the account sync key from the user's master secret with
//! PBKDF2-HMAC-SHA-512. The salt is generated once per account and
//! persisted (base64) alongside the other sync metadata; the same
//! (secret, salt) pair always derives the same key, which is what lets
//! every device arrive at the shared key independently.

use crate::error::{CryptoError, CryptoResult};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the sync key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the KDF salt in bytes.
pub const SALT_SIZE: usize = 16;

/// The derived account sync key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SyncKey {
    bytes: [u8; KEY_SIZE],
}

impl SyncKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SyncKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for key derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a salt from raw bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }

    /// Encodes the salt for persistence.
    pub fn to_base64(&self) -> String {
        use base64::{Engine, engine::general_purpose::STANDARD};
        STANDARD.encode(self.bytes)
    }

    /// Decodes a persisted salt.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        use base64::{Engine, engine::general_purpose::STANDARD};
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid salt base64: {}", e)))?;
        let bytes: [u8; SALT_SIZE] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| CryptoError::InvalidKeyLength {
                    expected: SALT_SIZE,
                    actual: v.len(),
                })?;
        Ok(Self { bytes })
    }
}

/// Key derivation parameters.
#[derive(Clone, Debug)]
pub struct KdfParams {
    /// PBKDF2 iteration count.
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // Floor of 100k iterations for PBKDF2-SHA-512; headroom on top.
        Self {
            iterations: 150_000,
        }
    }
}

impl KdfParams {
    /// Fast parameters for tests (insecure).
    pub fn fast() -> Self {
        Self { iterations: 10 }
    }
}

/// Derives the account sync key from the master secret.
///
/// Deterministic for the same (secret, salt) pair.
pub fn derive_sync_key(master_secret: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<SyncKey> {
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be non-zero".to_string(),
        ));
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(
        master_secret.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut key_bytes,
    );

    Ok(SyncKey::from_bytes(key_bytes))
}

/// Generates a random key (for tests and key rotation flows).
pub fn generate_random_key() -> SyncKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    SyncKey::from_bytes(bytes)
}
