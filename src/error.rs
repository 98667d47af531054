use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

/// Error taxonomy shared by adapters and the orchestration service.
///
/// `Http` carries the vendor status code and renders as `HTTP_<status>`,
/// matching the wire spelling consumed by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotSupported,
    NotFound,
    AuthError,
    AuthTimeout,
    ConnectionError,
    NotConnected,
    Http(u16),
    Timeout,
    RequestError,
    ParseError,
    HealthCheckFailed,
    ConnectionNotFound,
    ConnectionInactive,
    NoCredentials,
    CredentialError,
    UnsupportedProvider,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::NotSupported => write!(f, "NOT_SUPPORTED"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::AuthError => write!(f, "AUTH_ERROR"),
            ErrorCode::AuthTimeout => write!(f, "AUTH_TIMEOUT"),
            ErrorCode::ConnectionError => write!(f, "CONNECTION_ERROR"),
            ErrorCode::NotConnected => write!(f, "NOT_CONNECTED"),
            ErrorCode::Http(status) => write!(f, "HTTP_{}", status),
            ErrorCode::Timeout => write!(f, "TIMEOUT"),
            ErrorCode::RequestError => write!(f, "REQUEST_ERROR"),
            ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
            ErrorCode::HealthCheckFailed => write!(f, "HEALTH_CHECK_FAILED"),
            ErrorCode::ConnectionNotFound => write!(f, "CONNECTION_NOT_FOUND"),
            ErrorCode::ConnectionInactive => write!(f, "CONNECTION_INACTIVE"),
            ErrorCode::NoCredentials => write!(f, "NO_CREDENTIALS"),
            ErrorCode::CredentialError => write!(f, "CREDENTIAL_ERROR"),
            ErrorCode::UnsupportedProvider => write!(f, "UNSUPPORTED_PROVIDER"),
        }
    }
}

/// Structured error returned by adapter operations.
///
/// Adapters report every expected failure mode through this type rather
/// than panicking; the original vendor error body is preserved in
/// `provider_error` for debugging.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AdapterError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, Value>,
    pub provider_error: Option<String>,
}

impl AdapterError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
            provider_error: None,
        }
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn with_provider_error(mut self, raw: impl Into<String>) -> Self {
        self.provider_error = Some(raw.into());
        self
    }

    pub fn not_supported(provider_name: &str, capability: &str) -> Self {
        Self::new(
            ErrorCode::NotSupported,
            format!("{} does not support {}", provider_name, capability),
        )
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }
}

/// Error surfaced at the orchestration service boundary.
///
/// Carries the adapter's code and message unchanged so the HTTP layer can
/// map codes to status codes without re-parsing messages.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, Value>,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

impl From<AdapterError> for ServiceError {
    fn from(err: AdapterError) -> Self {
        ServiceError {
            code: err.code,
            message: err.message,
            details: err.details,
        }
    }
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_wire_spelling() {
        assert_eq!(ErrorCode::NotSupported.to_string(), "NOT_SUPPORTED");
        assert_eq!(ErrorCode::Http(404).to_string(), "HTTP_404");
        assert_eq!(ErrorCode::Http(502).to_string(), "HTTP_502");
        assert_eq!(ErrorCode::UnsupportedProvider.to_string(), "UNSUPPORTED_PROVIDER");
    }

    #[test]
    fn adapter_error_preserves_code_through_service_boundary() {
        let err = AdapterError::new(ErrorCode::Timeout, "Request timed out")
            .with_detail("endpoint", serde_json::json!("/ns-api/v2/subscribers"));
        let service: ServiceError = err.into();
        assert_eq!(service.code, ErrorCode::Timeout);
        assert_eq!(service.message, "Request timed out");
        assert!(service.details.contains_key("endpoint"));
    }
}
