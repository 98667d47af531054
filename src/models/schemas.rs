//! Universal VoIP entity schemas.
//!
//! Every adapter translates its vendor's records into these shapes, so the
//! calling application always sees consistent data regardless of which
//! provider backs a connection. Unknown vendor enum values degrade to the
//! `Other`/`Unknown` buckets instead of failing an operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    Pending,
}

impl Default for UserStatus {
    fn default() -> Self {
        UserStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Busy,
    Unknown,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    DeskPhone,
    Softphone,
    MobileApp,
    Webrtc,
    /// Analog Telephone Adapter
    Ata,
    Conference,
    Other,
}

impl Default for DeviceType {
    fn default() -> Self {
        DeviceType::DeskPhone
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Ringing,
    Active,
    Held,
    Parked,
    Ended,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Inbound,
    Outbound,
    Internal,
    Unknown,
}

/// Original provider-specific record attached to a translated entity.
///
/// `raw_data` holds the vendor payload verbatim for audit, debugging, and
/// potential round-trip reconstruction. It is never used for logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub provider_type: String,
    /// Original ID from the provider.
    pub raw_id: String,
    pub raw_data: Value,
}

/// Universal representation of a VoIP user/extension.
///
/// Maps to a NetSapiens subscriber, a RingCentral extension, an 8x8 user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoipUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub extension: Option<String>,
    /// Direct Inward Dial (phone number).
    pub did: Option<String>,
    pub status: UserStatus,
    pub department: Option<String>,
    pub site: Option<String>,
    pub has_voicemail: bool,
    pub has_sms: bool,
    pub has_fax: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub provider_metadata: Option<ProviderMetadata>,
}

impl VoipUser {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => self
                .display_name
                .clone()
                .unwrap_or_else(|| self.username.clone()),
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub extension: Option<String>,
    /// Some providers require an initial password.
    pub password: Option<String>,
    pub department: Option<String>,
    pub site: Option<String>,
}

/// Fields that can be updated on a user. `None` means leave unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub extension: Option<String>,
    pub status: Option<UserStatus>,
    pub department: Option<String>,
}

/// Universal representation of a VoIP device/phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoipDevice {
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    /// Which user owns this device.
    pub user_id: Option<String>,
    pub extension: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub status: DeviceStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub provider_metadata: Option<ProviderMetadata>,
}

/// Data required to create/provision a new device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCreate {
    pub name: String,
    pub device_type: DeviceType,
    pub mac_address: String,
    pub user_id: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// Universal representation of a live or historical call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoipCall {
    pub id: String,
    pub from_number: String,
    pub to_number: String,
    pub direction: CallDirection,
    pub status: CallStatus,
    pub user_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub provider_metadata: Option<ProviderMetadata>,
}

/// Parameters for transferring a call to another destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Extension or external number receiving the call.
    pub destination: String,
    /// Announce the transfer to the destination before completing it.
    #[serde(default)]
    pub announce: bool,
}

/// Parameters for bridging calls into a conference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConferenceRequest {
    /// Calls to bridge into the new conference.
    pub call_ids: Vec<String>,
    pub name: Option<String>,
}

/// Parameters for starting a call recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingRequest {
    /// Audio container requested from the vendor, e.g. "wav".
    pub format: Option<String>,
    /// Record each leg into its own channel where the vendor supports it.
    #[serde(default)]
    pub split_channels: bool,
}

/// Standard paginated response wrapper.
///
/// `page` is 1-indexed. The constructor enforces the pagination contract
/// `has_more == (page * page_size) < total` for every list operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        let has_more = (page as u64) * (page_size as u64) < total;
        Self {
            items,
            total,
            page,
            page_size,
            has_more,
        }
    }
}
