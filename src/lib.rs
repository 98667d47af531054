//! Universal VoIP provider integration layer.
//!
//! Translates between one universal schema for users, devices, and calls
//! and the many UCaaS vendor APIs behind it. Each provider is integrated
//! through a capability-negotiated adapter; the orchestration service binds
//! a persisted tenant connection to an adapter instance, runs operations
//! against it, and audits every one.
//!
//! Layering:
//! - [`models`] — the universal entity schemas all adapters translate into
//! - [`adapters`] — the [`adapters::VoipAdapter`] contract, concrete
//!   implementations, and the provider registry
//! - [`service`] — connection lifecycle, credential resolution, audit
//! - [`error`] — the structured error taxonomy shared by all layers

pub mod adapters;
pub mod error;
pub mod models;
pub mod service;

pub use adapters::{AdapterConfig, AdapterRegistry, MockAdapter, NetSapiensAdapter, VoipAdapter};
pub use error::{AdapterError, AdapterResult, ErrorCode, Result, ServiceError};
pub use service::{ServiceContext, VoipService};
