//! Collaborator traits supplied by the embedding application.
//!
//! The engine deliberately does not know how audit logs or settings are
//! stored; it asks a `ChangeSource` for changed plaintext and hands
//! accepted remote plaintext back. Forensic visibility goes through the
//! `AuditSink`.

use crate::error::SyncError;
use async_trait::async_trait;
use vigil_types::{DataType, RecordId};

/// One changed local record, ready for encryption.
#[derive(Debug, Clone)]
pub struct LocalChange {
    /// Stable identity of the logical record.
    pub record_id: RecordId,
    /// Caller-assigned monotonic version for this record.
    pub version: u64,
    /// Serialized plaintext state.
    pub plaintext: Vec<u8>,
}

/// Supplies local changes for a data type and applies accepted remote
/// state back. Implemented by the audit-log store, the settings store,
/// and so on.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Collects the changed state for `data_type`, or `None` if nothing
    /// changed since the last successful sync.
    async fn collect_changes(&self, data_type: DataType)
    -> Result<Option<LocalChange>, SyncError>;

    /// Applies remote state that survived conflict resolution.
    async fn apply_remote(
        &self,
        data_type: DataType,
        record_id: RecordId,
        plaintext: Vec<u8>,
    ) -> Result<(), SyncError>;
}

/// Forensic events emitted by the engine.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A sync cycle began.
    SyncStarted,
    /// A sync cycle ran to completion.
    SyncCompleted {
        uploaded: usize,
        downloaded: usize,
        conflicts: usize,
    },
    /// A sync cycle aborted.
    SyncFailed { reason: String },
    /// A payload failed integrity checks and was discarded.
    PayloadDiscarded {
        payload_id: RecordId,
        reason: String,
    },
}

/// Receives forensic events. Failures inside the sink must not break
/// sync; implementations log and swallow their own errors.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Sink that drops every event, for callers without an audit store.
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: AuditEvent) {}
}
