//! Durable offline queue for payloads that failed to upload.

use crate::error::SyncError;
use crate::payload::SyncPayload;
use crate::storage::{KeyValueStore, Sensitivity, keys};
use crate::transport::SyncTransport;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Entries uploaded and removed from the queue.
    pub uploaded: usize,
    /// Entries still queued after the pass.
    pub remaining: usize,
}

/// Bounded FIFO of payloads awaiting upload, persisted as one JSON array
/// under `keys::OFFLINE_QUEUE` (whole-collection writes).
///
/// When full, the OLDEST entry is evicted to make room. Under sustained
/// disconnection this drops the oldest unsynced change first; callers
/// size the bound accordingly.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    max_size: usize,
}

impl OfflineQueue {
    /// Creates a queue over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>, max_size: usize) -> Self {
        Self { store, max_size }
    }

    /// Appends a payload, evicting the oldest entry if at capacity.
    pub async fn enqueue(&self, payload: SyncPayload) -> Result<(), SyncError> {
        let mut entries = self.load().await?;

        while entries.len() >= self.max_size {
            let evicted = entries.remove(0);
            warn!(
                payload_id = %evicted.id,
                data_type = %evicted.data_type,
                "offline queue full, evicting oldest entry"
            );
        }

        entries.push(payload);
        self.save(&entries).await
    }

    /// Attempts to upload every queued entry, in order.
    ///
    /// Entries that succeed are removed; entries that fail stay queued
    /// for the next pass. A failure does not stop the pass: delivery is
    /// best-effort, not strictly ordered.
    pub async fn drain(&self, transport: &dyn SyncTransport) -> Result<DrainOutcome, SyncError> {
        let entries = self.load().await?;
        if entries.is_empty() {
            return Ok(DrainOutcome {
                uploaded: 0,
                remaining: 0,
            });
        }

        let mut remaining = Vec::new();
        let mut uploaded = 0;

        for payload in entries {
            match transport.upload(&payload).await {
                Ok(()) => {
                    debug!(payload_id = %payload.id, "drained queued payload");
                    uploaded += 1;
                }
                Err(e) => {
                    warn!(payload_id = %payload.id, "queued upload still failing: {}", e);
                    remaining.push(payload);
                }
            }
        }

        self.save(&remaining).await?;
        Ok(DrainOutcome {
            uploaded,
            remaining: remaining.len(),
        })
    }

    /// Number of queued entries.
    pub async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.load().await?.len())
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.load().await?.is_empty())
    }

    /// Snapshot of the queued entries, oldest first.
    pub async fn peek_all(&self) -> Result<Vec<SyncPayload>, SyncError> {
        self.load().await
    }

    async fn load(&self) -> Result<Vec<SyncPayload>, SyncError> {
        match self.store.get(keys::OFFLINE_QUEUE).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, entries: &[SyncPayload]) -> Result<(), SyncError> {
        let json = serde_json::to_string(entries)?;
        self.store
            .put(keys::OFFLINE_QUEUE, &json, Sensitivity::Standard)
            .await
    }
}
