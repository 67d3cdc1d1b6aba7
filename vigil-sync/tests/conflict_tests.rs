//! Conflict resolution strategies and the durable manual queue.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use vigil_sync::{
    ConflictResolution, ConflictResolver, ConflictStrategy, MemoryStore, SyncPayload,
};
use vigil_types::{DataType, DeviceId, RecordId};

// ── Helpers ──

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn payload(id: RecordId, timestamp: DateTime<Utc>, device: &str) -> SyncPayload {
    SyncPayload {
        id,
        data_type: DataType::AuditLogs,
        encrypted_data: "Y2lwaGVydGV4dA==".to_string(),
        iv: "AAAAAAAAAAAAAAAA".to_string(),
        auth_tag: "AAAAAAAAAAAAAAAAAAAAAA==".to_string(),
        version: 1,
        timestamp,
        device_id: DeviceId::from(device),
        checksum: "00".repeat(32),
    }
}

fn resolver(strategy: ConflictStrategy) -> ConflictResolver {
    ConflictResolver::new(Arc::new(MemoryStore::new()), strategy)
}

// ── Last write wins ──

#[tokio::test]
async fn lww_keeps_strictly_newer_remote() {
    let resolver = resolver(ConflictStrategy::LastWriteWins);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(5), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepRemote);
    assert!(conflict.is_remote_newer());
}

#[tokio::test]
async fn lww_keeps_strictly_newer_local() {
    let resolver = resolver(ConflictStrategy::LastWriteWins);
    let id = RecordId::new();
    let local = payload(id, base_time() + Duration::minutes(5), "a");
    let remote = payload(id, base_time(), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepLocal);
}

#[tokio::test]
async fn lww_tie_resolves_to_local() {
    let resolver = resolver(ConflictStrategy::LastWriteWins);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time(), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepLocal);
}

// ── Fixed strategies ──

#[tokio::test]
async fn local_first_ignores_timestamps() {
    let resolver = resolver(ConflictStrategy::LocalFirst);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::hours(1), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepLocal);
}

#[tokio::test]
async fn remote_first_ignores_timestamps() {
    let resolver = resolver(ConflictStrategy::RemoteFirst);
    let id = RecordId::new();
    let local = payload(id, base_time() + Duration::hours(1), "a");
    let remote = payload(id, base_time(), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepRemote);
}

#[tokio::test]
async fn per_call_strategy_overrides_default() {
    let resolver = resolver(ConflictStrategy::LocalFirst);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time(), "b");

    let conflict = resolver
        .resolve_conflict(&local, &remote, Some(ConflictStrategy::RemoteFirst))
        .await
        .unwrap();

    assert_eq!(conflict.resolution, ConflictResolution::KeepRemote);
}

// ── Auto merge ──

#[tokio::test]
async fn auto_merge_never_succeeds() {
    let resolver = resolver(ConflictStrategy::LastWriteWins);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time(), "b");

    assert!(resolver.attempt_auto_merge(&local, &remote).is_none());
}

// ── Manual queue ──

#[tokio::test]
async fn manual_strategy_queues_pending_conflict() {
    let resolver = resolver(ConflictStrategy::Manual);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(1), "b");

    let conflict = resolver.resolve_conflict(&local, &remote, None).await.unwrap();
    assert_eq!(conflict.resolution, ConflictResolution::Pending);
    assert!(conflict.requires_manual_resolution());

    let pending = resolver.get_pending_conflicts().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload_id, id);
    assert!(pending[0].local_payload.is_some());
    assert!(pending[0].remote_payload.is_some());
}

#[tokio::test]
async fn requeueing_same_record_replaces_entry() {
    let resolver = resolver(ConflictStrategy::Manual);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(1), "b");

    resolver.resolve_conflict(&local, &remote, None).await.unwrap();
    let newer_remote = payload(id, base_time() + Duration::minutes(9), "b");
    resolver.resolve_conflict(&local, &newer_remote, None).await.unwrap();

    let pending = resolver.get_pending_conflicts().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].remote_timestamp,
        base_time() + Duration::minutes(9)
    );
}

#[tokio::test]
async fn manual_resolution_removes_entry_and_returns_it() {
    let resolver = resolver(ConflictStrategy::Manual);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(1), "b");
    resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    let resolved = resolver
        .resolve_manual_conflict(id, ConflictResolution::KeepRemote)
        .await
        .unwrap();

    let resolved = resolved.expect("conflict was queued");
    assert_eq!(resolved.resolution, ConflictResolution::KeepRemote);
    assert!(resolver.get_pending_conflicts().await.unwrap().is_empty());
}

#[tokio::test]
async fn resolving_unknown_conflict_is_a_noop() {
    let resolver = resolver(ConflictStrategy::Manual);

    let resolved = resolver
        .resolve_manual_conflict(RecordId::new(), ConflictResolution::KeepLocal)
        .await
        .unwrap();

    assert!(resolved.is_none());
}

#[tokio::test]
async fn pending_conflicts_survive_resolver_restart() {
    let store = Arc::new(MemoryStore::new());
    let id = RecordId::new();

    {
        let resolver = ConflictResolver::new(store.clone(), ConflictStrategy::Manual);
        let local = payload(id, base_time(), "a");
        let remote = payload(id, base_time() + Duration::minutes(1), "b");
        resolver.resolve_conflict(&local, &remote, None).await.unwrap();
    }

    let resolver = ConflictResolver::new(store, ConflictStrategy::Manual);
    let pending = resolver.get_pending_conflicts().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload_id, id);
}

#[tokio::test]
async fn corrupt_pending_queue_is_an_error_not_a_reset() {
    use vigil_sync::{KeyValueStore, Sensitivity, SyncError, storage::keys};

    let store = Arc::new(MemoryStore::new());
    let resolver = ConflictResolver::new(store.clone(), ConflictStrategy::Manual);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(1), "b");
    resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    store
        .put(keys::PENDING_CONFLICTS, "{corrupt", Sensitivity::Standard)
        .await
        .unwrap();

    // An unreadable queue must surface, not silently drop pending work.
    let err = resolver.get_pending_conflicts().await.unwrap_err();
    assert!(matches!(err, SyncError::Serialization(_)));

    // The corrupt blob stays in place for operator inspection.
    let raw = store.get(keys::PENDING_CONFLICTS).await.unwrap().unwrap();
    assert_eq!(raw, "{corrupt");
}

#[tokio::test]
async fn clear_drops_all_pending_conflicts() {
    let resolver = resolver(ConflictStrategy::Manual);
    let id = RecordId::new();
    let local = payload(id, base_time(), "a");
    let remote = payload(id, base_time() + Duration::minutes(1), "b");
    resolver.resolve_conflict(&local, &remote, None).await.unwrap();

    resolver.clear_pending_conflicts().await.unwrap();

    assert!(resolver.get_pending_conflicts().await.unwrap().is_empty());
}
