//! The unit of transport: one encrypted, checksummed block of state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::{DataType, DeviceId, RecordId};

/// One encrypted, self-describing unit of syncable state.
///
/// Immutable value type: a superseding edit is a new payload with a
/// bumped `version` and fresh `timestamp`, never a mutation. Wire field
/// names are camelCase to match the relay's JSON surface; binary fields
/// (`iv`, `encrypted_data`, `auth_tag`) are base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    /// Stable identity of the logical record (not the transport attempt).
    pub id: RecordId,
    /// Category of state carried by this payload.
    pub data_type: DataType,
    /// Base64 ciphertext.
    pub encrypted_data: String,
    /// Base64 96-bit nonce, unique per encryption under a given key.
    pub iv: String,
    /// Base64 128-bit AEAD tag.
    pub auth_tag: String,
    /// Monotonically increasing per logical record, caller-assigned.
    pub version: u64,
    /// Creation instant (UTC, ISO-8601 on the wire).
    pub timestamp: DateTime<Utc>,
    /// Origin device.
    pub device_id: DeviceId,
    /// SHA-256 hex digest over the raw ciphertext. Validated before the
    /// ciphertext is trusted for AEAD decryption.
    pub checksum: String,
}
