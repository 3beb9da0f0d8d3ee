//! Error types for the NexusFlow client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Normalized error payload returned by the remote API.
///
/// The server answers failures with either a plain string, a `{"detail": ...}`
/// object or a map of field names to messages. All three shapes are folded
/// into this one type at the API-client boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code, when the failure came from an HTTP response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable message for the request as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Field-level validation messages keyed by field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    /// Creates an error carrying only a detail message.
    pub fn with_detail(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Returns true when the payload carries no message at all.
    pub fn is_empty(&self) -> bool {
        self.detail.is_none() && self.fields.is_empty()
    }

    /// Returns the best single-line message for display.
    ///
    /// Prefers `detail`; otherwise joins the field messages as
    /// `field: message` pairs in field-name order.
    pub fn message(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            return Some(detail.clone());
        }
        if self.fields.is_empty() {
            return None;
        }
        let joined = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message().unwrap_or_else(|| "no details".to_string());
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, message),
            None => write!(f, "{}", message),
        }
    }
}

/// A shared error type for the entire NexusFlow client.
///
/// Validation errors are raised before any remote call, `Api` carries a
/// server rejection, and `Network` covers transport failures with no
/// structured payload.
#[derive(Error, Debug, Clone)]
pub enum NexusError {
    /// Input rejected locally before reaching the server
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Server responded with an error payload
    #[error("Remote API error: {0}")]
    Api(ApiError),

    /// Transport failure (connection refused, timeout, TLS...)
    #[error("Network error: {0}")]
    Network(String),

    /// Refresh token rejected; the user must sign in again
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Operation requires an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Another mutation on the same entity has not completed yet
    #[error("A mutation on {entity_type} '{id}' is already in flight")]
    MutationInFlight { entity_type: &'static str, id: String },

    /// Request abandoned through its cancellation token
    #[error("Request cancelled")]
    Cancelled,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: &'static str, id: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable client storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NexusError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a MutationInFlight error
    pub fn mutation_in_flight(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::MutationInFlight {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Serialization error
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error was raised before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if the server rejected the request
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// Check if this is a transport failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if the request was rejected by the per-entity mutation guard
    pub fn is_mutation_in_flight(&self) -> bool {
        matches!(self, Self::MutationInFlight { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the request was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the server payload when the server rejected the request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns the HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        self.api_error().and_then(|payload| payload.status)
    }

    /// Returns the message a user should see for this error.
    ///
    /// Server messages and local validation messages are shown as-is; every
    /// other failure collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(payload) => payload.message().unwrap_or_else(|| fallback.to_string()),
            Self::Validation { message, .. } => message.clone(),
            Self::MutationInFlight { .. } | Self::SessionExpired => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<ApiError> for NexusError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<std::io::Error> for NexusError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NexusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NexusError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NexusError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for NexusError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, NexusError>`.
pub type Result<T> = std::result::Result<T, NexusError>;
