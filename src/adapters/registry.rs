//! Adapter registry.
//!
//! An explicit, injectable table mapping a lower-cased provider-type string
//! to an adapter constructor. Built at startup; all lookups go through one
//! instance rather than ambient global state. Every resolution produces an
//! independent adapter bound to the given config — nothing is cached or
//! shared across resolutions.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{AdapterError, AdapterResult, ErrorCode};

use super::mock::MockAdapter;
use super::netsapiens::NetSapiensAdapter;
use super::traits::{AdapterConfig, VoipAdapter};

/// Constructor for one provider's adapter.
pub type AdapterConstructor = fn(AdapterConfig) -> Box<dyn VoipAdapter>;

pub struct AdapterRegistry {
    constructors: HashMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    /// Build the registry with the built-in providers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };
        registry.register(NetSapiensAdapter::PROVIDER_TYPE, |config| {
            Box::new(NetSapiensAdapter::new(config))
        });
        registry.register(MockAdapter::PROVIDER_TYPE, |config| {
            Box::new(MockAdapter::new(config))
        });
        registry
    }

    /// Register a provider constructor under its type key.
    pub fn register(&mut self, provider_type: &str, constructor: AdapterConstructor) {
        info!("🏭 Registering adapter: {}", provider_type);
        self.constructors
            .insert(provider_type.to_lowercase(), constructor);
    }

    /// Instantiate a fresh adapter for the given provider type, or fail
    /// with UNSUPPORTED_PROVIDER enumerating the known types.
    pub fn resolve(
        &self,
        provider_type: &str,
        config: AdapterConfig,
    ) -> AdapterResult<Box<dyn VoipAdapter>> {
        let key = provider_type.to_lowercase();
        match self.constructors.get(&key) {
            Some(constructor) => {
                debug!("🔌 Creating adapter for: {}", key);
                Ok(constructor(config))
            }
            None => Err(AdapterError::new(
                ErrorCode::UnsupportedProvider,
                format!(
                    "Unsupported provider: {}. Supported: {}",
                    provider_type,
                    self.supported_types().join(", ")
                ),
            )),
        }
    }

    /// Known provider types, sorted for stable messages.
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn is_supported(&self, provider_type: &str) -> bool {
        self.constructors.contains_key(&provider_type.to_lowercase())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
