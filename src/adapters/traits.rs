use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AdapterError, AdapterResult};
use crate::models::{
    CallPage, ConferenceRequest, DeviceCreate, DevicePage, RecordingRequest, TransferRequest,
    UserCreate, UserPage, UserStatus, UserUpdate, VoipCall, VoipDevice, VoipUser,
};

/// Default timeout for vendor HTTP calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Configuration handed to an adapter for one connection attempt.
///
/// Built fresh by the orchestration service per connect; owned exclusively
/// by the adapter instance using it. `credentials` holds decrypted secret
/// material and must never be logged.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub base_url: String,
    /// Decrypted credential material (client_id, client_secret, ...).
    pub credentials: HashMap<String, String>,
    /// Provider-specific configuration (tenant domain, territory, ...).
    pub config: HashMap<String, String>,
    pub timeout: Duration,
    /// Carried for the calling layer; retry policy is the caller's job.
    pub max_retries: u32,
}

impl AdapterConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: HashMap::new(),
            config: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 3,
        }
    }

    pub fn with_credential(mut self, key: &str, value: &str) -> Self {
        self.credentials.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Contract every provider adapter satisfies.
///
/// Connection lifecycle and user/device operations are mandatory. The long
/// tail of capabilities (call control, queues, history, recordings, phone
/// numbers, voicemail) defaults to a `NOT_SUPPORTED` result naming the
/// provider; concrete adapters override only what the vendor actually
/// supports. Callers discover support through the error code rather than a
/// separate capability-query call, so the contract stays uniform no matter
/// how many vendors are integrated.
///
/// Pagination contract, binding on all list operations: `page` is
/// 1-indexed, `items.len() <= page_size`, and
/// `has_more == (page * page_size) < total`. Search filters behave as
/// case-insensitive substring matches and status filters as exact matches
/// at the universal-schema level, however the vendor expresses them.
#[async_trait]
pub trait VoipAdapter: Send + Sync + std::fmt::Debug {
    /// Registry key for this adapter, e.g. `"netsapiens"`.
    fn provider_type(&self) -> &'static str;

    /// Human-readable provider name used in `NOT_SUPPORTED` messages.
    fn provider_name(&self) -> &'static str;

    // ── Connection lifecycle ────────────────────────────────────────────

    /// Validate credentials and set up the vendor client.
    async fn connect(&self) -> AdapterResult<()>;

    /// Release the underlying client. Idempotent; safe before a successful
    /// connect and after a prior disconnect.
    async fn disconnect(&self);

    /// Verify the provider connection is healthy.
    async fn health_check(&self) -> AdapterResult<Value>;

    // ── Users (mandatory) ───────────────────────────────────────────────

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
        status: Option<UserStatus>,
    ) -> AdapterResult<UserPage>;

    async fn get_user(&self, user_id: &str) -> AdapterResult<VoipUser>;

    async fn create_user(&self, user: &UserCreate) -> AdapterResult<VoipUser>;

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> AdapterResult<VoipUser>;

    async fn delete_user(&self, user_id: &str) -> AdapterResult<()>;

    // ── Devices (mandatory) ─────────────────────────────────────────────

    async fn list_devices(
        &self,
        page: u32,
        page_size: u32,
        user_id: Option<&str>,
    ) -> AdapterResult<DevicePage>;

    async fn get_device(&self, device_id: &str) -> AdapterResult<VoipDevice>;

    async fn create_device(&self, device: &DeviceCreate) -> AdapterResult<VoipDevice>;

    async fn delete_device(&self, device_id: &str) -> AdapterResult<()>;

    // ── Call control (optional) ─────────────────────────────────────────

    async fn get_active_calls(
        &self,
        _user_id: Option<&str>,
        _page: u32,
        _page_size: u32,
    ) -> AdapterResult<CallPage> {
        Err(self.unsupported("call control"))
    }

    async fn get_call(&self, _call_id: &str) -> AdapterResult<VoipCall> {
        Err(self.unsupported("call control"))
    }

    async fn transfer_call(
        &self,
        _call_id: &str,
        _request: &TransferRequest,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn hold_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn resume_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn mute_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn unmute_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn hangup_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn park_call(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn unpark_call(&self, _park_code: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    // ── Conferencing / recording control (optional) ─────────────────────

    async fn create_conference(&self, _request: &ConferenceRequest) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn add_to_conference(
        &self,
        _conference_id: &str,
        _call_id: &str,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn remove_from_conference(
        &self,
        _conference_id: &str,
        _call_id: &str,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn start_recording(
        &self,
        _call_id: &str,
        _request: Option<&RecordingRequest>,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    async fn stop_recording(&self, _call_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call control"))
    }

    // ── Call queues (optional) ──────────────────────────────────────────

    async fn list_call_queues(&self) -> AdapterResult<Value> {
        Err(self.unsupported("call queues"))
    }

    async fn get_call_queue(&self, _queue_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("call queues"))
    }

    // ── Call history / recordings (optional) ────────────────────────────

    async fn get_call_history(
        &self,
        _user_id: Option<&str>,
        _start: Option<DateTime<Utc>>,
        _end: Option<DateTime<Utc>>,
        _page: u32,
        _page_size: u32,
    ) -> AdapterResult<CallPage> {
        Err(self.unsupported("call history"))
    }

    async fn get_recording(
        &self,
        _call_id: &str,
        _user_id: Option<&str>,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("recordings"))
    }

    // ── Phone numbers / voicemail (optional) ────────────────────────────

    async fn list_phone_numbers(
        &self,
        _page: u32,
        _page_size: u32,
        _assigned: Option<bool>,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("phone number management"))
    }

    async fn get_phone_number(&self, _number_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("phone number management"))
    }

    async fn list_voicemails(
        &self,
        _user_id: &str,
        _folder: &str,
        _page: u32,
        _page_size: u32,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("voicemail"))
    }

    async fn get_voicemail(&self, _voicemail_id: &str, _user_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("voicemail"))
    }

    async fn delete_voicemail(&self, _voicemail_id: &str, _user_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("voicemail"))
    }

    // ── Meetings (optional) ─────────────────────────────────────────────

    async fn create_meeting(
        &self,
        _user_id: &str,
        _name: Option<&str>,
        _start_time: Option<DateTime<Utc>>,
        _duration_minutes: Option<u32>,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("meetings"))
    }

    async fn get_meeting(&self, _meeting_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("meetings"))
    }

    async fn list_meetings(
        &self,
        _user_id: Option<&str>,
        _page: u32,
        _page_size: u32,
    ) -> AdapterResult<Value> {
        Err(self.unsupported("meetings"))
    }

    async fn delete_meeting(&self, _meeting_id: &str) -> AdapterResult<Value> {
        Err(self.unsupported("meetings"))
    }

    /// Standard failure for a capability this provider does not implement.
    fn unsupported(&self, capability: &str) -> AdapterError {
        AdapterError::not_supported(self.provider_name(), capability)
    }
}
