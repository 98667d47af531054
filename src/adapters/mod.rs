//! Provider adapter layer.
//!
//! Built around three pieces:
//! - the capability-negotiated [`VoipAdapter`] contract (`traits`),
//! - concrete implementations (`netsapiens`, `mock`),
//! - the [`AdapterRegistry`] resolving a provider-type string to a fresh
//!   adapter instance.

pub mod mock;
pub mod netsapiens;
pub mod registry;
pub mod traits;


pub use mock::MockAdapter;
pub use netsapiens::{infer_call_direction, NetSapiensAdapter};
pub use registry::{AdapterConstructor, AdapterRegistry};
pub use traits::{AdapterConfig, VoipAdapter, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};
