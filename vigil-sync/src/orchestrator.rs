//! Sync orchestrator: drives the full upload/download cycle.
//!
//! Owns the single-flight guard, the offline queue, and the last-sync
//! stamp. Everything stateful it touches goes through the collaborator
//! traits, so the whole cycle is drivable from tests with in-memory
//! doubles.

use crate::collaborators::{AuditEvent, AuditSink, ChangeSource};
use crate::codec::PayloadCodec;
use crate::config::SyncConfig;
use crate::conflict::ConflictResolver;
use crate::error::SyncError;
use crate::models::{ConflictResolution, SyncConflict, SyncResult, SyncStatus};
use crate::payload::SyncPayload;
use crate::queue::OfflineQueue;
use crate::storage::{KeyValueStore, Sensitivity, keys};
use crate::transport::SyncTransport;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use vigil_types::{DataType, RecordId};

/// Coordinates one account's sync cycles.
///
/// At most one cycle runs at a time; a second `perform_sync` while one
/// is in flight fails fast with `SyncError::SyncInProgress` rather than
/// queueing behind it.
pub struct SyncOrchestrator {
    config: SyncConfig,
    codec: PayloadCodec,
    resolver: ConflictResolver,
    queue: OfflineQueue,
    transport: Arc<dyn SyncTransport>,
    store: Arc<dyn KeyValueStore>,
    sources: HashMap<DataType, Arc<dyn ChangeSource>>,
    audit: Arc<dyn AuditSink>,
    in_flight: Mutex<()>,
}

impl SyncOrchestrator {
    /// Builds an orchestrator; the resolver and offline queue are derived
    /// from `config`.
    pub fn new(
        config: SyncConfig,
        codec: PayloadCodec,
        transport: Arc<dyn SyncTransport>,
        store: Arc<dyn KeyValueStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let resolver = ConflictResolver::new(store.clone(), config.default_strategy);
        let queue = OfflineQueue::new(store.clone(), config.max_offline_queue_size);

        Self {
            config,
            codec,
            resolver,
            queue,
            transport,
            store,
            sources: HashMap::new(),
            audit,
            in_flight: Mutex::new(()),
        }
    }

    /// Registers the change source backing a data type. A type with no
    /// source is skipped on upload and its remote payloads are dropped.
    pub fn register_source(&mut self, data_type: DataType, source: Arc<dyn ChangeSource>) {
        self.sources.insert(data_type, source);
    }

    /// The active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The conflict resolver, for manual-resolution flows.
    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// The offline queue, for inspection.
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// When the last cycle completed, if one ever has.
    ///
    /// A corrupt stamp reads as `None`; the next download simply pulls
    /// more history than strictly necessary.
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        let Some(raw) = self.store.get(keys::LAST_SYNC_TIME).await? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(t) => Ok(Some(t.with_timezone(&Utc))),
            Err(e) => {
                warn!("last-sync stamp unreadable, treating as never synced: {}", e);
                Ok(None)
            }
        }
    }

    /// Runs a full cycle over every enabled data type.
    ///
    /// Returns `Err` only when a cycle is already in flight; every other
    /// failure is folded into the returned `SyncResult`.
    pub async fn perform_sync(&self) -> Result<SyncResult, SyncError> {
        let types: Vec<DataType> = self.config.enabled_data_types.iter().copied().collect();
        self.perform_sync_for(&types).await
    }

    /// Syncs only the audit-log data type.
    pub async fn sync_audit_logs(&self) -> Result<SyncResult, SyncError> {
        self.perform_sync_for(&[DataType::AuditLogs]).await
    }

    /// Syncs only the security-settings data type.
    pub async fn sync_security_settings(&self) -> Result<SyncResult, SyncError> {
        self.perform_sync_for(&[DataType::SecuritySettings]).await
    }

    async fn perform_sync_for(&self, types: &[DataType]) -> Result<SyncResult, SyncError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SyncError::SyncInProgress)?;

        self.audit.record(AuditEvent::SyncStarted).await;
        info!(?types, "sync cycle started");

        match self.run_cycle(types).await {
            Ok(result) => {
                if result.status == SyncStatus::Failed {
                    self.audit
                        .record(AuditEvent::SyncFailed {
                            reason: result
                                .error_message
                                .clone()
                                .unwrap_or_else(|| "unknown".to_string()),
                        })
                        .await;
                } else {
                    self.audit
                        .record(AuditEvent::SyncCompleted {
                            uploaded: result.uploaded_count,
                            downloaded: result.downloaded_count,
                            conflicts: result.conflicts.len(),
                        })
                        .await;
                }
                info!(
                    status = ?result.status,
                    uploaded = result.uploaded_count,
                    downloaded = result.downloaded_count,
                    conflicts = result.conflicts.len(),
                    "sync cycle finished"
                );
                Ok(result)
            }
            Err(e) => {
                error!("sync cycle aborted: {}", e);
                self.audit
                    .record(AuditEvent::SyncFailed {
                        reason: e.to_string(),
                    })
                    .await;
                Ok(SyncResult::failed(e.to_string()))
            }
        }
    }

    async fn run_cycle(&self, types: &[DataType]) -> Result<SyncResult, SyncError> {
        let since = self.last_sync_time().await?;

        let mut uploaded = 0usize;
        let mut downloaded = 0usize;
        let mut conflicts: Vec<SyncConflict> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        // Payloads produced this cycle, keyed by identity, for conflict
        // detection against incoming remotes.
        let mut local_payloads: HashMap<(RecordId, DataType), SyncPayload> = HashMap::new();

        for &data_type in types {
            let Some(source) = self.sources.get(&data_type) else {
                debug!(%data_type, "no change source registered, skipping");
                continue;
            };

            let change = match source.collect_changes(data_type).await {
                Ok(Some(change)) => change,
                Ok(None) => {
                    debug!(%data_type, "no local changes");
                    continue;
                }
                Err(e) => {
                    warn!(%data_type, "collecting changes failed: {}", e);
                    failures.push(format!("{}: {}", data_type, e));
                    continue;
                }
            };

            // Encryption failures abort the whole cycle.
            let payload = self.codec.encrypt_payload(
                &change.plaintext,
                data_type,
                change.record_id,
                change.version,
            )?;
            local_payloads.insert((payload.id, data_type), payload.clone());

            match self.transport.upload(&payload).await {
                Ok(()) => uploaded += 1,
                Err(e) if e.is_recoverable() => {
                    warn!(%data_type, "upload failed, queueing for retry: {}", e);
                    failures.push(format!("{}: {}", data_type, e));
                    // A queue-persistence failure aborts the cycle.
                    self.queue.enqueue(payload).await?;
                }
                Err(e) => {
                    warn!(%data_type, "upload failed: {}", e);
                    failures.push(format!("{}: {}", data_type, e));
                }
            }
        }

        let drained = self.queue.drain(self.transport.as_ref()).await?;
        uploaded += drained.uploaded;

        match self.transport.download(since).await {
            Ok(remotes) => {
                for remote in remotes {
                    if !types.contains(&remote.data_type) {
                        continue;
                    }
                    if &remote.device_id == self.codec.device_id() {
                        continue;
                    }

                    if let Some(local) = local_payloads.get(&(remote.id, remote.data_type)) {
                        let conflict = self.resolver.resolve_conflict(local, &remote, None).await?;
                        let keep_remote = conflict.resolution == ConflictResolution::KeepRemote;
                        conflicts.push(conflict);
                        if !keep_remote {
                            continue;
                        }
                    }

                    if self.apply_remote(&remote).await? {
                        downloaded += 1;
                    }
                }
            }
            Err(e) => {
                warn!("download failed: {}", e);
                failures.push(format!("download: {}", e));
            }
        }

        // Stamped even after per-type failures so a retried cycle does not
        // re-pull history that was already applied.
        let completed_at = Utc::now();
        self.store
            .put(
                keys::LAST_SYNC_TIME,
                &completed_at.to_rfc3339(),
                Sensitivity::Standard,
            )
            .await?;

        let made_progress = uploaded > 0 || downloaded > 0 || !conflicts.is_empty();
        let status = if conflicts.iter().any(SyncConflict::requires_manual_resolution) {
            SyncStatus::Conflict
        } else if !failures.is_empty() && !made_progress {
            SyncStatus::Failed
        } else if !failures.is_empty() || !conflicts.is_empty() {
            SyncStatus::PartialSuccess
        } else if made_progress {
            SyncStatus::Success
        } else {
            SyncStatus::NoChanges
        };

        Ok(SyncResult {
            status,
            uploaded_count: uploaded,
            downloaded_count: downloaded,
            conflicts,
            last_sync_time: Some(completed_at),
            error_message: if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            },
        })
    }

    /// Decrypts and hands one remote payload to its change source.
    ///
    /// A cryptographic failure discards the payload whole (audited, never
    /// retried) and returns `Ok(false)`; apply-side failures propagate.
    async fn apply_remote(&self, remote: &SyncPayload) -> Result<bool, SyncError> {
        let Some(source) = self.sources.get(&remote.data_type) else {
            debug!(data_type = %remote.data_type, "no source for remote payload, dropping");
            return Ok(false);
        };

        let plaintext = match self.codec.decrypt_payload(remote) {
            Ok(plaintext) => plaintext,
            Err(e @ SyncError::Crypto(_)) => {
                warn!(payload_id = %remote.id, "discarding remote payload: {}", e);
                self.audit
                    .record(AuditEvent::PayloadDiscarded {
                        payload_id: remote.id,
                        reason: e.to_string(),
                    })
                    .await;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        source
            .apply_remote(remote.data_type, remote.id, plaintext)
            .await?;
        Ok(true)
    }
}
