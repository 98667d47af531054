//! Universal data shapes produced and consumed by every provider adapter.

pub mod schemas;

pub use schemas::{
    CallDirection, CallStatus, ConferenceRequest, DeviceCreate, DeviceStatus, DeviceType, Page,
    ProviderMetadata, RecordingRequest, TransferRequest, UserCreate, UserStatus, UserUpdate,
    VoipCall, VoipDevice, VoipUser,
};

/// Paginated list of users.
pub type UserPage = Page<VoipUser>;
/// Paginated list of devices.
pub type DevicePage = Page<VoipDevice>;
/// Paginated list of calls.
pub type CallPage = Page<VoipCall>;
