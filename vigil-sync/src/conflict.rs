//! Conflict resolution between divergent per-device edits.
//!
//! Resolution is whole-payload: one side survives, per a configurable
//! strategy. Field-level merge is an explicit extension point
//! (`attempt_auto_merge` never succeeds today).

use crate::error::SyncError;
use crate::models::{ConflictResolution, SyncConflict};
use crate::payload::SyncPayload;
use crate::storage::{KeyValueStore, Sensitivity, keys};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use vigil_types::RecordId;

/// Strategy for deciding which of two divergent payloads survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictStrategy {
    /// Strictly newer timestamp wins; ties resolve to local.
    LastWriteWins,
    /// Local always wins, regardless of timestamps.
    LocalFirst,
    /// Remote always wins, regardless of timestamps.
    RemoteFirst,
    /// Queue for manual resolution.
    Manual,
}

/// Resolves conflicts and owns the durable manual-resolution queue.
///
/// The queue (under `keys::PENDING_CONFLICTS`) is the only mutable state
/// here, rewritten whole on every change.
pub struct ConflictResolver {
    store: Arc<dyn KeyValueStore>,
    default_strategy: ConflictStrategy,
}

impl ConflictResolver {
    /// Creates a resolver over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>, default_strategy: ConflictStrategy) -> Self {
        Self {
            store,
            default_strategy,
        }
    }

    /// The strategy applied when callers pass no override.
    pub fn default_strategy(&self) -> ConflictStrategy {
        self.default_strategy
    }

    /// Decides which of two payloads claiming the same identity survives.
    ///
    /// Under `Manual`, the conflict is appended to the durable queue
    /// before this returns; a queue-persistence failure propagates to
    /// the caller rather than dropping the conflict.
    pub async fn resolve_conflict(
        &self,
        local: &SyncPayload,
        remote: &SyncPayload,
        strategy: Option<ConflictStrategy>,
    ) -> Result<SyncConflict, SyncError> {
        let strategy = strategy.unwrap_or(self.default_strategy);

        let resolution = match strategy {
            ConflictStrategy::LastWriteWins => {
                // Ties resolve to local. Exact tie-break, do not change.
                if remote.timestamp > local.timestamp {
                    ConflictResolution::KeepRemote
                } else {
                    ConflictResolution::KeepLocal
                }
            }
            ConflictStrategy::LocalFirst => ConflictResolution::KeepLocal,
            ConflictStrategy::RemoteFirst => ConflictResolution::KeepRemote,
            ConflictStrategy::Manual => ConflictResolution::Pending,
        };

        let conflict = SyncConflict {
            payload_id: local.id,
            data_type: local.data_type,
            resolution,
            local_timestamp: local.timestamp,
            remote_timestamp: remote.timestamp,
            local_payload: Some(local.clone()),
            remote_payload: Some(remote.clone()),
        };

        debug!(
            payload_id = %conflict.payload_id,
            data_type = %conflict.data_type,
            ?resolution,
            "resolved conflict"
        );

        if resolution == ConflictResolution::Pending {
            self.queue_for_manual_resolution(conflict.clone()).await?;
        }

        Ok(conflict)
    }

    /// Attempts a field-level merge of two payloads.
    ///
    /// Returns `None` when the data types differ (incompatible), and
    /// `None` otherwise as well: merging is an unimplemented extension
    /// point. Callers must not assume merge ever succeeds.
    pub fn attempt_auto_merge(
        &self,
        local: &SyncPayload,
        remote: &SyncPayload,
    ) -> Option<SyncPayload> {
        if local.data_type != remote.data_type {
            return None;
        }
        None
    }

    /// Conflicts currently awaiting manual resolution.
    pub async fn get_pending_conflicts(&self) -> Result<Vec<SyncConflict>, SyncError> {
        self.load_queue().await
    }

    /// Appends a conflict to the durable manual-resolution queue.
    ///
    /// Re-queuing an id that is already pending replaces the stored
    /// entry rather than duplicating it.
    pub async fn queue_for_manual_resolution(
        &self,
        conflict: SyncConflict,
    ) -> Result<(), SyncError> {
        let mut queue = self.load_queue().await?;
        queue.retain(|c| c.payload_id != conflict.payload_id);
        queue.push(conflict);
        self.save_queue(&queue).await
    }

    /// Records the chosen resolution and removes the matching entry.
    ///
    /// Idempotent: resolving an id that is not queued is a no-op.
    /// Returns the resolved conflict, if one was queued.
    pub async fn resolve_manual_conflict(
        &self,
        payload_id: RecordId,
        resolution: ConflictResolution,
    ) -> Result<Option<SyncConflict>, SyncError> {
        let mut queue = self.load_queue().await?;
        let position = queue.iter().position(|c| c.payload_id == payload_id);

        let Some(position) = position else {
            debug!(%payload_id, "manual resolution for unknown conflict, ignoring");
            return Ok(None);
        };

        let mut resolved = queue.remove(position);
        resolved.resolution = resolution;
        self.save_queue(&queue).await?;

        Ok(Some(resolved))
    }

    /// Drops every pending conflict.
    pub async fn clear_pending_conflicts(&self) -> Result<(), SyncError> {
        self.store.delete(keys::PENDING_CONFLICTS).await
    }

    async fn load_queue(&self) -> Result<Vec<SyncConflict>, SyncError> {
        match self.store.get(keys::PENDING_CONFLICTS).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_queue(&self, queue: &[SyncConflict]) -> Result<(), SyncError> {
        let json = serde_json::to_string(queue)?;
        self.store
            .put(keys::PENDING_CONFLICTS, &json, Sensitivity::Standard)
            .await
    }
}
