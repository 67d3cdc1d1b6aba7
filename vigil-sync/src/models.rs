//! Value models: conflicts, cycle outcomes, and device records.

use crate::payload::SyncPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::{DataType, DeviceId, RecordId};

/// How a conflict was (or will be) resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// The local payload survives.
    KeepLocal,
    /// The remote payload survives.
    KeepRemote,
    /// A merged payload survives (extension point, never produced today).
    Merge,
    /// Awaiting manual resolution; the conflict sits in the durable queue.
    Pending,
}

/// Two payloads with the same `(id, data_type)` but divergent content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    /// Identity of the contested record.
    pub payload_id: RecordId,
    /// Category of the contested record.
    pub data_type: DataType,
    /// Chosen (or pending) resolution.
    pub resolution: ConflictResolution,
    /// Creation instant of the local payload.
    pub local_timestamp: DateTime<Utc>,
    /// Creation instant of the remote payload.
    pub remote_timestamp: DateTime<Utc>,
    /// The local payload, if retained for manual resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_payload: Option<SyncPayload>,
    /// The remote payload, if retained for manual resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_payload: Option<SyncPayload>,
}

impl SyncConflict {
    /// True when the local payload is strictly newer.
    pub fn is_local_newer(&self) -> bool {
        self.local_timestamp > self.remote_timestamp
    }

    /// True when the remote payload is strictly newer.
    pub fn is_remote_newer(&self) -> bool {
        self.remote_timestamp > self.local_timestamp
    }

    /// True while the conflict awaits manual resolution.
    pub fn requires_manual_resolution(&self) -> bool {
        self.resolution == ConflictResolution::Pending
    }
}

/// Outcome class of one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    /// Everything uploaded/downloaded cleanly.
    Success,
    /// The cycle could not make progress.
    Failed,
    /// Work completed, but some types failed or conflicts were resolved.
    PartialSuccess,
    /// Successful no-op: nothing to upload, nothing downloaded.
    ///
    /// Distinct from `Success` so callers can suppress idle-sync UI.
    NoChanges,
    /// The cycle halted on conflicts that await manual resolution.
    Conflict,
}

/// Outcome of one sync cycle.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Outcome class.
    pub status: SyncStatus,
    /// Payloads successfully uploaded (including offline-queue drains).
    pub uploaded_count: usize,
    /// Remote payloads applied locally.
    pub downloaded_count: usize,
    /// Conflicts encountered this cycle.
    pub conflicts: Vec<SyncConflict>,
    /// When the cycle stamped its completion, if it got that far.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Human-readable failure detail, if any.
    pub error_message: Option<String>,
}

impl SyncResult {
    /// A successful no-op cycle.
    pub fn no_changes(last_sync_time: Option<DateTime<Utc>>) -> Self {
        Self {
            status: SyncStatus::NoChanges,
            uploaded_count: 0,
            downloaded_count: 0,
            conflicts: Vec::new(),
            last_sync_time,
            error_message: None,
        }
    }

    /// A cycle that could not make progress.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Failed,
            uploaded_count: 0,
            downloaded_count: 0,
            conflicts: Vec::new(),
            last_sync_time: None,
            error_message: Some(message.into()),
        }
    }

    /// Whether the caller should surface a conflict-resolution prompt.
    pub fn requires_conflict_resolution(&self) -> bool {
        self.conflicts.iter().any(SyncConflict::requires_manual_resolution)
    }
}

/// A device registered against the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDevice {
    /// Server-side device identity.
    pub device_id: DeviceId,
    /// Human-readable name chosen at registration.
    pub device_name: String,
    /// Base64 public key presented at registration.
    pub public_key: String,
    /// When the device registered.
    pub registered_at: DateTime<Utc>,
    /// Last completed sync, if the server has seen one.
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Derived locally by comparing against the stored device id;
    /// never sent on the wire.
    #[serde(skip, default)]
    pub is_current_device: bool,
}

/// Wire body for registering a device (`POST /sync/devices`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub device_id: DeviceId,
    pub device_name: String,
    pub public_key: String,
    pub registered_at: DateTime<Utc>,
}
