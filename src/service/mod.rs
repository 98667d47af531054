//! Orchestration service.
//!
//! Binds a persisted connection to a live adapter instance: resolves the
//! provider and credentials, manages connect/disconnect lifecycle, runs one
//! logical operation at a time, writes one audit entry per operation, and
//! maps adapter failures to service-level errors at the boundary.
//!
//! A [`VoipService`] is scoped to one unit of work (typically one inbound
//! request); callers construct a fresh instance per request and must ensure
//! `disconnect()` runs on every exit path.

pub mod stores;


use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::{AdapterConfig, AdapterRegistry, VoipAdapter};
use crate::error::{AdapterResult, ErrorCode, Result, ServiceError};
use crate::models::{
    CallPage, ConferenceRequest, DeviceCreate, DevicePage, RecordingRequest, TransferRequest,
    UserCreate, UserPage, UserUpdate, VoipCall, VoipDevice, VoipUser,
};

pub use stores::{
    AuditEntry, AuditOutcome, AuditSink, Connection, ConnectionStatus, ConnectionStore,
    CredentialCipher, CredentialStore, EncryptedCredential, InMemoryAuditSink,
    InMemoryConnectionStore, InMemoryCredentialStore, PassthroughCipher,
};

/// Injected collaborators shared by service instances.
#[derive(Clone)]
pub struct ServiceContext {
    pub registry: Arc<AdapterRegistry>,
    pub connections: Arc<dyn ConnectionStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub cipher: Arc<dyn CredentialCipher>,
    pub audit: Arc<dyn AuditSink>,
}

/// Per-request orchestration facade over one provider connection.
///
/// State machine: unbound → connected → (operation)* → disconnected.
/// Not intended to be shared across concurrent callers.
pub struct VoipService {
    connection_id: Uuid,
    ctx: ServiceContext,
    connection: Option<Connection>,
    adapter: Option<Box<dyn VoipAdapter>>,
    connected: bool,
}

impl VoipService {
    pub fn new(connection_id: Uuid, ctx: ServiceContext) -> Self {
        Self {
            connection_id,
            ctx,
            connection: None,
            adapter: None,
            connected: false,
        }
    }

    /// The connection loaded by `connect()`, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Resolve the connection, decrypt its credentials, build the adapter,
    /// and connect it. On adapter failure the connection's status is
    /// persisted as `Error` with the failure message before the same error
    /// propagates to the caller.
    pub async fn connect(&mut self) -> Result<()> {
        let connection = self
            .ctx
            .connections
            .load(self.connection_id)
            .await?
            .ok_or_else(|| {
                ServiceError::new(
                    ErrorCode::ConnectionNotFound,
                    format!("Provider connection not found: {}", self.connection_id),
                )
            })?;

        if connection.status == ConnectionStatus::Inactive {
            return Err(ServiceError::new(
                ErrorCode::ConnectionInactive,
                "Provider connection is inactive",
            ));
        }

        let credential = self
            .ctx
            .credentials
            .load(self.connection_id)
            .await?
            .ok_or_else(|| {
                ServiceError::new(
                    ErrorCode::NoCredentials,
                    "No credentials configured for this connection",
                )
            })?;

        let decrypted = self.ctx.cipher.decrypt(&credential).map_err(|e| {
            warn!("❌ Failed to decrypt credentials: {}", e);
            ServiceError::new(ErrorCode::CredentialError, "Failed to decrypt credentials")
        })?;

        let domain = connection.config.get("domain").cloned().unwrap_or_default();
        let base_url = connection.api_base_url_template.replace("{domain}", &domain);

        let mut config = AdapterConfig::new(base_url);
        config.credentials = decrypted;
        config.config = connection.config.clone();

        let adapter = self
            .ctx
            .registry
            .resolve(&connection.provider_type, config)?;

        if let Err(e) = adapter.connect().await {
            if let Err(store_err) = self
                .ctx
                .connections
                .update_status(
                    self.connection_id,
                    ConnectionStatus::Error,
                    Some(e.message.clone()),
                )
                .await
            {
                warn!("⚠️ Failed to persist connection error state: {}", store_err);
            }
            return Err(e.into());
        }

        info!(
            "✅ Connected to {} for connection {}",
            adapter.provider_name(),
            connection.name
        );
        self.connection = Some(connection);
        self.adapter = Some(adapter);
        self.connected = true;
        Ok(())
    }

    /// Release the adapter's underlying connection. Safe to call before a
    /// successful connect and repeatedly after one.
    pub async fn disconnect(&mut self) {
        if let Some(adapter) = &self.adapter {
            adapter.disconnect().await;
        }
        self.connected = false;
    }

    fn adapter(&self) -> Result<&dyn VoipAdapter> {
        if !self.connected {
            return Err(ServiceError::new(
                ErrorCode::NotConnected,
                "Service not connected. Call connect() first.",
            ));
        }
        self.adapter.as_deref().ok_or_else(|| {
            ServiceError::new(
                ErrorCode::NotConnected,
                "Service not connected. Call connect() first.",
            )
        })
    }

    // ── Audit envelope ──────────────────────────────────────────────────

    /// Append an audit entry, swallowing sink failures: auditing must never
    /// fail the operation that triggered it.
    async fn record(&self, entry: AuditEntry) {
        let entry = match self.connection {
            Some(ref connection) => entry.with_connection(connection.id),
            None => entry,
        };
        if let Err(e) = self.ctx.audit.append(entry).await {
            warn!("⚠️ Failed to append audit entry: {}", e);
        }
    }

    /// Uniform operation envelope: stamp the duration, emit exactly one
    /// audit entry, and convert a failed adapter result into a service
    /// error carrying the adapter's code and message unchanged.
    async fn finish<T>(
        &self,
        result: AdapterResult<T>,
        entry: AuditEntry,
        started: Instant,
        summarize: impl FnOnce(&T) -> Value,
    ) -> Result<T> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(payload) => {
                self.record(
                    entry
                        .with_response(summarize(&payload))
                        .with_duration(duration_ms),
                )
                .await;
                Ok(payload)
            }
            Err(e) => {
                self.record(entry.with_error(&e.message).with_duration(duration_ms))
                    .await;
                Err(e.into())
            }
        }
    }

    // ── Health ──────────────────────────────────────────────────────────

    pub async fn health_check(&self) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.health_check().await;
        self.finish(
            result,
            AuditEntry::new("health_check", "connection"),
            started,
            |v| v.clone(),
        )
        .await
    }

    // ── User operations ─────────────────────────────────────────────────

    pub async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<UserPage> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.list_users(page, page_size, search, None).await;
        self.finish(
            result,
            AuditEntry::new("read", "user").with_request(json!({
                "page": page,
                "page_size": page_size,
                "search": search,
            })),
            started,
            |users| json!({ "total": users.total }),
        )
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<VoipUser> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.get_user(user_id).await;
        self.finish(
            result,
            AuditEntry::new("read", "user").with_resource_id(user_id),
            started,
            |_| Value::Null,
        )
        .await
    }

    pub async fn create_user(&self, user: &UserCreate) -> Result<VoipUser> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.create_user(user).await;
        // Request summary stays free of the password field.
        let request = json!({
            "username": user.username,
            "email": user.email,
            "extension": user.extension,
        });
        let entry = match &result {
            Ok(created) => AuditEntry::new("create", "user").with_resource_id(&created.id),
            Err(_) => AuditEntry::new("create", "user"),
        };
        self.finish(result, entry.with_request(request), started, |_| Value::Null)
            .await
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<VoipUser> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.update_user(user_id, update).await;
        self.finish(
            result,
            AuditEntry::new("update", "user")
                .with_resource_id(user_id)
                .with_request(serde_json::to_value(update).unwrap_or(Value::Null)),
            started,
            |_| Value::Null,
        )
        .await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.delete_user(user_id).await;
        self.finish(
            result,
            AuditEntry::new("delete", "user").with_resource_id(user_id),
            started,
            |_| Value::Null,
        )
        .await?;
        Ok(json!({ "deleted": true, "user_id": user_id }))
    }

    // ── Device operations ───────────────────────────────────────────────

    pub async fn list_devices(
        &self,
        page: u32,
        page_size: u32,
        user_id: Option<&str>,
    ) -> Result<DevicePage> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.list_devices(page, page_size, user_id).await;
        self.finish(
            result,
            AuditEntry::new("read", "device").with_request(json!({
                "page": page,
                "page_size": page_size,
                "user_id": user_id,
            })),
            started,
            |devices| json!({ "total": devices.total }),
        )
        .await
    }

    pub async fn get_device(&self, device_id: &str) -> Result<VoipDevice> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.get_device(device_id).await;
        self.finish(
            result,
            AuditEntry::new("read", "device").with_resource_id(device_id),
            started,
            |_| Value::Null,
        )
        .await
    }

    pub async fn create_device(&self, device: &DeviceCreate) -> Result<VoipDevice> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.create_device(device).await;
        let entry = match &result {
            Ok(created) => AuditEntry::new("create", "device").with_resource_id(&created.id),
            Err(_) => AuditEntry::new("create", "device"),
        };
        self.finish(
            result,
            entry.with_request(serde_json::to_value(device).unwrap_or(Value::Null)),
            started,
            |_| Value::Null,
        )
        .await
    }

    pub async fn delete_device(&self, device_id: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.delete_device(device_id).await;
        self.finish(
            result,
            AuditEntry::new("delete", "device").with_resource_id(device_id),
            started,
            |_| Value::Null,
        )
        .await?;
        Ok(json!({ "deleted": true, "device_id": device_id }))
    }

    // ── Call operations ─────────────────────────────────────────────────

    pub async fn get_active_calls(
        &self,
        user_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<CallPage> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.get_active_calls(user_id, page, page_size).await;
        self.finish(
            result,
            AuditEntry::new("read", "call").with_request(json!({
                "page": page,
                "user_id": user_id,
            })),
            started,
            |calls| json!({ "total": calls.total }),
        )
        .await
    }

    pub async fn get_call(&self, call_id: &str) -> Result<VoipCall> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.get_call(call_id).await;
        self.finish(
            result,
            AuditEntry::new("read", "call").with_resource_id(call_id),
            started,
            |_| Value::Null,
        )
        .await
    }

    pub async fn transfer_call(&self, call_id: &str, request: &TransferRequest) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.transfer_call(call_id, request).await;
        self.finish(
            result,
            AuditEntry::new("transfer", "call")
                .with_resource_id(call_id)
                .with_request(serde_json::to_value(request).unwrap_or(Value::Null)),
            started,
            |v| v.clone(),
        )
        .await
    }

    pub async fn hold_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "hold").await
    }

    pub async fn resume_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "resume").await
    }

    pub async fn mute_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "mute").await
    }

    pub async fn unmute_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "unmute").await
    }

    pub async fn hangup_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "hangup").await
    }

    pub async fn park_call(&self, call_id: &str) -> Result<Value> {
        self.call_action(call_id, "park").await
    }

    pub async fn unpark_call(&self, park_code: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.unpark_call(park_code).await;
        self.finish(
            result,
            AuditEntry::new("unpark", "call").with_request(json!({ "park_code": park_code })),
            started,
            |v| v.clone(),
        )
        .await
    }

    // ── Conferencing / recording control ────────────────────────────────

    pub async fn create_conference(&self, request: &ConferenceRequest) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.create_conference(request).await;
        self.finish(
            result,
            AuditEntry::new("create_conference", "call")
                .with_request(serde_json::to_value(request).unwrap_or(Value::Null)),
            started,
            |v| v.clone(),
        )
        .await
    }

    pub async fn add_to_conference(&self, conference_id: &str, call_id: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.add_to_conference(conference_id, call_id).await;
        self.finish(
            result,
            AuditEntry::new("add_to_conference", "call")
                .with_resource_id(call_id)
                .with_request(json!({ "conference_id": conference_id })),
            started,
            |v| v.clone(),
        )
        .await
    }

    pub async fn remove_from_conference(
        &self,
        conference_id: &str,
        call_id: &str,
    ) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.remove_from_conference(conference_id, call_id).await;
        self.finish(
            result,
            AuditEntry::new("remove_from_conference", "call")
                .with_resource_id(call_id)
                .with_request(json!({ "conference_id": conference_id })),
            started,
            |v| v.clone(),
        )
        .await
    }

    pub async fn start_recording(
        &self,
        call_id: &str,
        request: Option<&RecordingRequest>,
    ) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.start_recording(call_id, request).await;
        let request_data = request
            .and_then(|r| serde_json::to_value(r).ok())
            .unwrap_or(Value::Null);
        self.finish(
            result,
            AuditEntry::new("start_recording", "call")
                .with_resource_id(call_id)
                .with_request(request_data),
            started,
            |v| v.clone(),
        )
        .await
    }

    pub async fn stop_recording(&self, call_id: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = adapter.stop_recording(call_id).await;
        self.finish(
            result,
            AuditEntry::new("stop_recording", "call").with_resource_id(call_id),
            started,
            |v| v.clone(),
        )
        .await
    }

    /// Shared envelope for the single-id call-control verbs.
    async fn call_action(&self, call_id: &str, action: &str) -> Result<Value> {
        let adapter = self.adapter()?;
        let started = Instant::now();
        let result = match action {
            "hold" => adapter.hold_call(call_id).await,
            "resume" => adapter.resume_call(call_id).await,
            "mute" => adapter.mute_call(call_id).await,
            "unmute" => adapter.unmute_call(call_id).await,
            "hangup" => adapter.hangup_call(call_id).await,
            "park" => adapter.park_call(call_id).await,
            _ => Err(adapter.unsupported(action)),
        };
        self.finish(
            result,
            AuditEntry::new(action, "call").with_resource_id(call_id),
            started,
            |v| v.clone(),
        )
        .await
    }
}
