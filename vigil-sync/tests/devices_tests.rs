//! Device registry: confirmation-gated persistence and list marking.

use std::sync::Arc;
use vigil_sync::transport::mock::MockTransport;
use vigil_sync::{DeviceRegistry, MemoryStore, SyncError};

fn registry(
    transport: Arc<MockTransport>,
    store: Arc<MemoryStore>,
) -> DeviceRegistry {
    DeviceRegistry::new(transport, store, "Workstation", "cGs=")
}

#[tokio::test]
async fn registration_persists_id_only_after_server_confirms() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let registry = registry(transport.clone(), store.clone());

    transport.fail_registration(true);
    let err = registry.register_device().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
    // The failed attempt must not leave a device id behind.
    assert!(registry.current_device_id().await.unwrap().is_none());

    transport.fail_registration(false);
    let device = registry.register_device().await.unwrap();
    assert!(device.is_current_device);
    assert_eq!(
        registry.current_device_id().await.unwrap(),
        Some(device.device_id)
    );
}

#[tokio::test]
async fn reregistration_reuses_the_stored_id() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let registry = registry(transport, store);

    let first = registry.register_device().await.unwrap();
    let second = registry.register_device().await.unwrap();

    assert_eq!(first.device_id, second.device_id);
}

#[tokio::test]
async fn device_ids_are_url_safe_and_opaque() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let registry = registry(transport, store);

    let device = registry.register_device().await.unwrap();
    let id = device.device_id.as_str();

    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[tokio::test]
async fn listing_marks_only_the_current_device() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let registry = registry(transport.clone(), store.clone());

    let ours = registry.register_device().await.unwrap();

    // Another device registers through its own client.
    let other = DeviceRegistry::new(
        transport.clone(),
        Arc::new(MemoryStore::new()),
        "Laptop",
        "cGsy",
    );
    other.register_device().await.unwrap();

    let devices = registry.get_registered_devices().await.unwrap();
    assert_eq!(devices.len(), 2);

    let current: Vec<_> = devices.iter().filter(|d| d.is_current_device).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].device_id, ours.device_id);
}

#[tokio::test]
async fn removed_devices_disappear_from_the_list() {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::new());
    let registry = registry(transport, store);

    let device = registry.register_device().await.unwrap();
    registry.remove_device(&device.device_id).await.unwrap();

    assert!(registry.get_registered_devices().await.unwrap().is_empty());
}
