//! Device registry client.
//!
//! Registers this installation against the account and maintains the
//! local view of the device list. Off the hot sync path: network
//! failures here surface directly to the caller.

use crate::error::SyncError;
use crate::models::{DeviceRegistration, SyncDevice};
use crate::storage::{KeyValueStore, Sensitivity, keys};
use crate::transport::SyncTransport;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use vigil_types::DeviceId;

/// Client for the account's device registry.
pub struct DeviceRegistry {
    transport: Arc<dyn SyncTransport>,
    store: Arc<dyn KeyValueStore>,
    device_name: String,
    public_key: String,
}

impl DeviceRegistry {
    /// Creates a registry client for this installation.
    ///
    /// `public_key` is the base64 device public key presented to the
    /// server at registration.
    pub fn new(
        transport: Arc<dyn SyncTransport>,
        store: Arc<dyn KeyValueStore>,
        device_name: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            device_name: device_name.into(),
            public_key: public_key.into(),
        }
    }

    /// The locally stored device id, if registration ever completed.
    pub async fn current_device_id(&self) -> Result<Option<DeviceId>, SyncError> {
        Ok(self
            .store
            .get(keys::CURRENT_DEVICE_ID)
            .await?
            .map(DeviceId::from_string))
    }

    /// Registers this device with the server.
    ///
    /// The device id is persisted locally only AFTER the server confirms
    /// the registration. Re-registering an already registered device
    /// reuses the stored id.
    pub async fn register_device(&self) -> Result<SyncDevice, SyncError> {
        let device_id = match self.current_device_id().await? {
            Some(existing) => existing,
            None => vigil_crypto::generate_device_id(),
        };

        let registration = DeviceRegistration {
            device_id: device_id.clone(),
            device_name: self.device_name.clone(),
            public_key: self.public_key.clone(),
            registered_at: Utc::now(),
        };

        self.transport.register_device(&registration).await?;

        self.store
            .put(keys::CURRENT_DEVICE_ID, device_id.as_str(), Sensitivity::Standard)
            .await?;

        info!(device_id = %device_id, "device registered");

        Ok(SyncDevice {
            device_id,
            device_name: registration.device_name,
            public_key: registration.public_key,
            registered_at: registration.registered_at,
            last_sync_at: None,
            is_current_device: true,
        })
    }

    /// Lists registered devices, marking the current one by comparing
    /// against the locally stored id.
    pub async fn get_registered_devices(&self) -> Result<Vec<SyncDevice>, SyncError> {
        let current = self.current_device_id().await?;
        let mut devices = self.transport.list_devices().await?;

        for device in &mut devices {
            device.is_current_device = current.as_ref() == Some(&device.device_id);
        }

        Ok(devices)
    }

    /// Removes a device registration from the server.
    pub async fn remove_device(&self, device_id: &DeviceId) -> Result<(), SyncError> {
        self.transport.remove_device(device_id).await
    }
}
