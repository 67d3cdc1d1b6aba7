//! Zero-knowledge sync engine for security-sensitive state.
//!
//! Plaintext never leaves the device: every payload is encrypted, tagged,
//! and checksummed by [`PayloadCodec`] before the transport sees it, and
//! the relay stores opaque ciphertext it cannot read. The
//! [`SyncOrchestrator`] drives full cycles (upload, offline-queue drain,
//! download, conflict resolution) over collaborator traits supplied by
//! the embedding application.

pub mod codec;
pub mod collaborators;
pub mod config;
pub mod conflict;
pub mod devices;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod payload;
pub mod queue;
pub mod storage;
pub mod transport;

pub use codec::{PayloadCodec, load_or_create_salt};
pub use collaborators::{AuditEvent, AuditSink, ChangeSource, LocalChange, NoopAuditSink};
pub use config::SyncConfig;
pub use conflict::{ConflictResolver, ConflictStrategy};
pub use devices::DeviceRegistry;
pub use error::SyncError;
pub use models::{
    ConflictResolution, DeviceRegistration, SyncConflict, SyncDevice, SyncResult, SyncStatus,
};
pub use orchestrator::SyncOrchestrator;
pub use payload::SyncPayload;
pub use queue::{DrainOutcome, OfflineQueue};
pub use storage::{KeyValueStore, MemoryStore, Sensitivity};
pub use transport::{HttpTransport, HttpTransportConfig, SyncTransport};
