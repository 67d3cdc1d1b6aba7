//! Process-wide sync configuration.

use crate::conflict::ConflictStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use vigil_types::DataType;

/// Long-lived configuration, read at the start of every cycle.
///
/// Mutated only by explicit user settings changes; the sync machinery
/// itself never writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the zero-knowledge relay.
    pub server_url: String,
    /// How often the caller should trigger a cycle.
    pub sync_interval: Duration,
    /// Data types participating in sync.
    pub enabled_data_types: BTreeSet<DataType>,
    /// Strategy applied when the resolver is not given an override.
    pub default_strategy: ConflictStrategy,
    /// Offline queue bound; the oldest entry is evicted beyond this.
    pub max_offline_queue_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: "https://sync.vigil.app".to_string(),
            sync_interval: Duration::from_secs(15 * 60),
            enabled_data_types: BTreeSet::from([DataType::AuditLogs, DataType::SecuritySettings]),
            default_strategy: ConflictStrategy::LastWriteWins,
            max_offline_queue_size: 100,
        }
    }
}
