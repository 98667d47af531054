//! External collaborator interfaces consumed by the orchestration service.
//!
//! Persistence, credential encryption-at-rest, and audit storage live
//! outside this crate; the service only consumes these contracts. The
//! in-memory implementations here back tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ErrorCode, Result, ServiceError};

/// Lifecycle status of a tenant-to-provider binding. The orchestration
/// service only ever requests a transition to `Error`; `Active` is set by
/// the external provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Active,
    Inactive,
    Error,
}

/// A persisted tenant-to-provider binding, consumed not owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub practice_id: Uuid,
    /// Connection name, e.g. "Main Office".
    pub name: String,
    pub provider_type: String,
    /// Template URL with a `{domain}` placeholder,
    /// e.g. `https://{domain}.netsapiens.com/`.
    pub api_base_url_template: String,
    /// Provider-specific configuration (domain, territory, ...).
    pub config: HashMap<String, String>,
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
}

/// Opaque encrypted credential blob, 1:1 with a connection.
#[derive(Debug, Clone)]
pub struct EncryptedCredential {
    pub connection_id: Uuid,
    pub credential_type: String,
    pub encrypted_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Partial,
}

/// One append-only record per logical operation. Written by the
/// orchestration service as a side effect, never read back by it.
/// Plaintext credentials must never appear in an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Action verb: "read", "create", "update", "delete", "transfer", ...
    pub action: String,
    /// Resource type: "user", "device", "call", "connection".
    pub resource_type: String,
    pub resource_id: String,
    pub connection_id: Option<Uuid>,
    pub request_data: Value,
    pub response_data: Value,
    pub outcome: AuditOutcome,
    pub error_message: Option<String>,
    pub duration_ms: Option<u64>,
}

impl AuditEntry {
    pub fn new(action: &str, resource_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: String::new(),
            connection_id: None,
            request_data: Value::Null,
            response_data: Value::Null,
            outcome: AuditOutcome::Success,
            error_message: None,
            duration_ms: None,
        }
    }

    pub fn with_resource_id(mut self, resource_id: &str) -> Self {
        self.resource_id = resource_id.to_string();
        self
    }

    pub fn with_connection(mut self, connection_id: Uuid) -> Self {
        self.connection_id = Some(connection_id);
        self
    }

    pub fn with_request(mut self, request_data: Value) -> Self {
        self.request_data = request_data;
        self
    }

    pub fn with_response(mut self, response_data: Value) -> Self {
        self.response_data = response_data;
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.outcome = AuditOutcome::Failure;
        self.error_message = Some(error.to_string());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Connection persistence, implemented by the storage layer.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Connection>>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ConnectionStatus,
        last_error: Option<String>,
    ) -> Result<()>;
}

/// Credential persistence, implemented by the storage layer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self, connection_id: Uuid) -> Result<Option<EncryptedCredential>>;
}

/// Decrypt contract. The encryption-at-rest implementation is external;
/// this layer only consumes the ability to turn a blob into a plain
/// key-value credential map.
pub trait CredentialCipher: Send + Sync {
    fn decrypt(&self, credential: &EncryptedCredential) -> Result<HashMap<String, String>>;
}

/// Fire-and-forget audit sink. Append failures must never fail the
/// triggering operation; the service logs and swallows them.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<()>;
}

// ── In-memory implementations (tests / local development) ───────────────

#[derive(Default)]
pub struct InMemoryConnectionStore {
    connections: RwLock<HashMap<Uuid, Connection>>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, connection: Connection) {
        self.connections
            .write()
            .await
            .insert(connection.id, connection);
    }

    pub async fn get(&self, id: Uuid) -> Option<Connection> {
        self.connections.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn load(&self, id: Uuid) -> Result<Option<Connection>> {
        Ok(self.connections.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ConnectionStatus,
        last_error: Option<String>,
    ) -> Result<()> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(&id).ok_or_else(|| {
            ServiceError::new(
                ErrorCode::ConnectionNotFound,
                format!("Provider connection not found: {}", id),
            )
        })?;
        connection.status = status;
        connection.last_error = last_error;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<Uuid, EncryptedCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, credential: EncryptedCredential) {
        self.credentials
            .write()
            .await
            .insert(credential.connection_id, credential);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, connection_id: Uuid) -> Result<Option<EncryptedCredential>> {
        Ok(self.credentials.read().await.get(&connection_id).cloned())
    }
}

/// Cipher for development fixtures: the "encrypted" blob is a UTF-8 JSON
/// object of string pairs. Real deployments plug in the external KMS-backed
/// implementation.
#[derive(Default)]
pub struct PassthroughCipher;

impl PassthroughCipher {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialCipher for PassthroughCipher {
    fn decrypt(&self, credential: &EncryptedCredential) -> Result<HashMap<String, String>> {
        serde_json::from_slice(&credential.encrypted_data).map_err(|_| {
            ServiceError::new(ErrorCode::CredentialError, "Failed to decrypt credentials")
        })
    }
}

#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
