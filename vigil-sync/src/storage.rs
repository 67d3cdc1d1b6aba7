//! Persistent key-value collaborator.
//!
//! The engine never touches the platform's secure storage directly; it
//! writes through this trait. Components own disjoint key namespaces
//! (orchestrator: offline queue + last-sync time; resolver: pending
//! conflicts) so no shared mutable structure crosses component
//! boundaries. Every write replaces the whole value: collections are
//! serialized and rewritten in one put, never edited in place.

use crate::error::SyncError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// At-rest protection tier for a stored value.
///
/// `Secret` values (the sync salt) demand the platform's strong
/// protection; `Standard` values (device id, queue contents, which are
/// already ciphertext) may use the weaker tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Standard,
    Secret,
}

/// Storage keys used by the engine.
pub mod keys {
    /// ISO-8601 instant of the last completed cycle. Orchestrator-owned.
    pub const LAST_SYNC_TIME: &str = "vigil.sync.last_sync_time";
    /// The confirmed device id for this installation.
    pub const CURRENT_DEVICE_ID: &str = "vigil.sync.device_id";
    /// JSON array of queued payloads awaiting upload. Orchestrator-owned.
    pub const OFFLINE_QUEUE: &str = "vigil.sync.offline_queue";
    /// JSON array of conflicts awaiting manual resolution. Resolver-owned.
    pub const PENDING_CONFLICTS: &str = "vigil.sync.pending_conflicts";
    /// Base64 per-account KDF salt.
    pub const SYNC_SALT: &str = "vigil.sync.salt";
}

/// Abstract persistent key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. Absence is `None`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError>;

    /// Writes a value, replacing any previous one atomically.
    async fn put(&self, key: &str, value: &str, sensitivity: Sensitivity)
    -> Result<(), SyncError>;

    /// Deletes a value. Deleting a missing key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), SyncError>;
}

/// In-memory store for tests and hosts without a platform keystore.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
        _sensitivity: Sensitivity,
    ) -> Result<(), SyncError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SyncError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
