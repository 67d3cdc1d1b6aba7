//! Transport layer: authenticated HTTP calls against the relay.
//!
//! The engine only ever talks through the `SyncTransport` trait;
//! `HttpTransport` is the production implementation and `mock` hosts the
//! scriptable test double.

use crate::error::SyncError;
use crate::models::{DeviceRegistration, SyncDevice};
use crate::payload::SyncPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};
use vigil_types::DeviceId;

/// A transport capable of moving payloads and device records to and
/// from the relay. All calls are time-bounded by the implementation.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Uploads one payload.
    async fn upload(&self, payload: &SyncPayload) -> Result<(), SyncError>;

    /// Downloads payloads changed since the given instant.
    ///
    /// Incremental `since` semantics are an extension point; callers
    /// must tolerate a server that returns everything.
    async fn download(&self, since: Option<DateTime<Utc>>)
    -> Result<Vec<SyncPayload>, SyncError>;

    /// Registers a device against the account.
    async fn register_device(&self, registration: &DeviceRegistration) -> Result<(), SyncError>;

    /// Lists registered devices.
    async fn list_devices(&self) -> Result<Vec<SyncDevice>, SyncError>;

    /// Removes a device registration.
    async fn remove_device(&self, device_id: &DeviceId) -> Result<(), SyncError>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Relay base URL, without a trailing slash.
    pub base_url: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Additional attempts after the first for recoverable failures.
    pub max_retries: u32,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sync.vigil.app".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

/// Production transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpTransport {
    /// Builds a transport with the configured per-call timeout.
    pub fn new(config: HttpTransportConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Runs `op` up to `1 + max_retries` times, retrying only
    /// recoverable (network/timeout) failures.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SyncError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{} failed (attempt {}), retrying: {}", what, attempt, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn map_send_error(e: reqwest::Error) -> SyncError {
        if e.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Network(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Network(format!("relay error {}: {}", status, body)))
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn upload(&self, payload: &SyncPayload) -> Result<(), SyncError> {
        self.with_retry("upload", || async move {
            let response = self
                .client
                .post(self.url("/sync/upload"))
                .json(payload)
                .send()
                .await
                .map_err(Self::map_send_error)?;
            Self::check_status(response).await?;
            Ok(())
        })
        .await?;

        debug!(payload_id = %payload.id, data_type = %payload.data_type, "uploaded payload");
        Ok(())
    }

    async fn download(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SyncPayload>, SyncError> {
        self.with_retry("download", || async move {
            let mut request = self.client.get(self.url("/sync/download"));
            if let Some(since) = since {
                request = request.query(&[("since", since.to_rfc3339())]);
            }

            let response = request.send().await.map_err(Self::map_send_error)?;
            let response = Self::check_status(response).await?;
            response
                .json::<Vec<SyncPayload>>()
                .await
                .map_err(|e| SyncError::InvalidResponse(e.to_string()))
        })
        .await
    }

    async fn register_device(&self, registration: &DeviceRegistration) -> Result<(), SyncError> {
        // Registration is not idempotent from the server's perspective,
        // so it gets exactly one attempt.
        let response = self
            .client
            .post(self.url("/sync/devices"))
            .json(registration)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list_devices(&self) -> Result<Vec<SyncDevice>, SyncError> {
        self.with_retry("list devices", || async move {
            let response = self
                .client
                .get(self.url("/sync/devices"))
                .send()
                .await
                .map_err(Self::map_send_error)?;
            let response = Self::check_status(response).await?;
            response
                .json::<Vec<SyncDevice>>()
                .await
                .map_err(|e| SyncError::InvalidResponse(e.to_string()))
        })
        .await
    }

    async fn remove_device(&self, device_id: &DeviceId) -> Result<(), SyncError> {
        self.with_retry("remove device", || async move {
            let response = self
                .client
                .delete(self.url(&format!("/sync/devices/{}", device_id)))
                .send()
                .await
                .map_err(Self::map_send_error)?;
            Self::check_status(response).await?;
            Ok(())
        })
        .await
    }
}

/// A scriptable transport for tests.
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use vigil_types::RecordId;

    /// Records uploads, serves scripted downloads, and fails on demand.
    #[derive(Default)]
    pub struct MockTransport {
        uploaded: Mutex<Vec<SyncPayload>>,
        downloads: Mutex<Vec<SyncPayload>>,
        devices: Mutex<Vec<SyncDevice>>,
        fail_uploads_for: Mutex<HashSet<RecordId>>,
        fail_all_uploads: Mutex<bool>,
        fail_downloads: Mutex<bool>,
        fail_registration: Mutex<bool>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Payloads uploaded so far, in order.
        pub fn uploaded(&self) -> Vec<SyncPayload> {
            self.uploaded.lock().unwrap().clone()
        }

        /// Queues payloads to be served by the next download.
        pub fn stage_download(&self, payloads: Vec<SyncPayload>) {
            self.downloads.lock().unwrap().extend(payloads);
        }

        /// Makes uploads of the given record fail with a network error.
        pub fn fail_upload_for(&self, id: RecordId) {
            self.fail_uploads_for.lock().unwrap().insert(id);
        }

        /// Stops failing uploads of the given record.
        pub fn heal_upload_for(&self, id: RecordId) {
            self.fail_uploads_for.lock().unwrap().remove(&id);
        }

        /// Makes every upload fail with a network error.
        pub fn fail_all_uploads(&self, fail: bool) {
            *self.fail_all_uploads.lock().unwrap() = fail;
        }

        /// Makes downloads fail with a network error.
        pub fn fail_downloads(&self, fail: bool) {
            *self.fail_downloads.lock().unwrap() = fail;
        }

        /// Makes device registration fail with a network error.
        pub fn fail_registration(&self, fail: bool) {
            *self.fail_registration.lock().unwrap() = fail;
        }

        /// Seeds the device list served by `list_devices`.
        pub fn seed_devices(&self, devices: Vec<SyncDevice>) {
            *self.devices.lock().unwrap() = devices;
        }
    }

    #[async_trait]
    impl SyncTransport for MockTransport {
        async fn upload(&self, payload: &SyncPayload) -> Result<(), SyncError> {
            if *self.fail_all_uploads.lock().unwrap()
                || self.fail_uploads_for.lock().unwrap().contains(&payload.id)
            {
                return Err(SyncError::Network("mock upload failure".to_string()));
            }
            self.uploaded.lock().unwrap().push(payload.clone());
            Ok(())
        }

        async fn download(
            &self,
            _since: Option<DateTime<Utc>>,
        ) -> Result<Vec<SyncPayload>, SyncError> {
            if *self.fail_downloads.lock().unwrap() {
                return Err(SyncError::Network("mock download failure".to_string()));
            }
            Ok(std::mem::take(&mut *self.downloads.lock().unwrap()))
        }

        async fn register_device(
            &self,
            registration: &DeviceRegistration,
        ) -> Result<(), SyncError> {
            if *self.fail_registration.lock().unwrap() {
                return Err(SyncError::Network("mock registration failure".to_string()));
            }
            self.devices.lock().unwrap().push(SyncDevice {
                device_id: registration.device_id.clone(),
                device_name: registration.device_name.clone(),
                public_key: registration.public_key.clone(),
                registered_at: registration.registered_at,
                last_sync_at: None,
                is_current_device: false,
            });
            Ok(())
        }

        async fn list_devices(&self) -> Result<Vec<SyncDevice>, SyncError> {
            Ok(self.devices.lock().unwrap().clone())
        }

        async fn remove_device(&self, device_id: &DeviceId) -> Result<(), SyncError> {
            self.devices
                .lock()
                .unwrap()
                .retain(|d| &d.device_id != device_id);
            Ok(())
        }
    }
}
