//! Payload codec: turns plaintext state into transportable payloads.
//!
//! Owns the derived sync key and this device's identity. Pure over
//! bytes; the orchestrator does all I/O around it.

use crate::error::SyncError;
use crate::payload::SyncPayload;
use crate::storage::{KeyValueStore, Sensitivity, keys};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use vigil_crypto::{CipherParts, CryptoError, NONCE_SIZE, Salt, SyncKey, TAG_SIZE};
use vigil_types::{DataType, DeviceId, RecordId};

/// Encrypts and decrypts sync payloads with the account key.
pub struct PayloadCodec {
    key: SyncKey,
    device_id: DeviceId,
}

impl PayloadCodec {
    /// Creates a codec for the given key and device identity.
    pub fn new(key: SyncKey, device_id: DeviceId) -> Self {
        Self { key, device_id }
    }

    /// The device identity stamped onto outgoing payloads.
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Encrypts plaintext into a transportable payload.
    ///
    /// Generates a fresh nonce, computes the ciphertext checksum, and
    /// stamps the current instant and this device's id. `version` is
    /// caller-assigned and must increase per logical record.
    pub fn encrypt_payload(
        &self,
        plaintext: &[u8],
        data_type: DataType,
        record_id: RecordId,
        version: u64,
    ) -> Result<SyncPayload, SyncError> {
        let parts = vigil_crypto::encrypt(&self.key, plaintext)?;
        let checksum = vigil_crypto::checksum(&parts.ciphertext);

        Ok(SyncPayload {
            id: record_id,
            data_type,
            encrypted_data: STANDARD.encode(&parts.ciphertext),
            iv: STANDARD.encode(parts.nonce),
            auth_tag: STANDARD.encode(parts.tag),
            version,
            timestamp: Utc::now(),
            device_id: self.device_id.clone(),
            checksum,
        })
    }

    /// Decrypts a payload back to plaintext.
    ///
    /// The checksum is validated before the ciphertext is handed to the
    /// AEAD (cheap pre-filter); either failure means the payload is
    /// discarded whole, never partially trusted and never retried.
    pub fn decrypt_payload(&self, payload: &SyncPayload) -> Result<Vec<u8>, SyncError> {
        let ciphertext = decode_field(&payload.encrypted_data, "encryptedData")?;
        vigil_crypto::verify_checksum(&ciphertext, &payload.checksum)?;

        let nonce_bytes = decode_field(&payload.iv, "iv")?;
        let nonce: [u8; NONCE_SIZE] =
            nonce_bytes
                .try_into()
                .map_err(|v: Vec<u8>| CryptoError::InvalidNonceLength {
                    expected: NONCE_SIZE,
                    actual: v.len(),
                })?;

        let tag_bytes = decode_field(&payload.auth_tag, "authTag")?;
        let tag: [u8; TAG_SIZE] =
            tag_bytes
                .try_into()
                .map_err(|v: Vec<u8>| CryptoError::Decryption(format!(
                    "auth tag length {} (expected {})",
                    v.len(),
                    TAG_SIZE
                )))?;

        let parts = CipherParts {
            nonce,
            ciphertext,
            tag,
        };
        Ok(vigil_crypto::decrypt(&self.key, &parts)?)
    }
}

/// Loads the per-account KDF salt, minting and persisting one on first use.
///
/// The salt is stored base64 under `keys::SYNC_SALT` at the `Secret`
/// tier. Every device of the account must see the same salt to derive
/// the same key.
pub async fn load_or_create_salt(store: &dyn KeyValueStore) -> Result<Salt, SyncError> {
    if let Some(encoded) = store.get(keys::SYNC_SALT).await? {
        return Ok(Salt::from_base64(&encoded)?);
    }

    let salt = Salt::random();
    store
        .put(keys::SYNC_SALT, &salt.to_base64(), Sensitivity::Secret)
        .await?;
    Ok(salt)
}

fn decode_field(encoded: &str, field: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::Decryption(format!("invalid base64 in {}: {}", field, e)))
}
