//! Error types for the items client.
//!
//! # Design
//! Three failure families reach a consumer:
//! - `ValidationError` is raised by the create form before any request exists.
//! - `ApiError` means the server answered, but not with a usable success.
//! - `RequestError::Connectivity` wraps whatever the transport returned when
//!   the server could not be reached at all. The transport's error is kept as
//!   the source and its message is shown as-is.

use thiserror::Error;

/// Error produced by a `Transport` that failed to complete a round-trip.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `ApiClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("API error: {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Status code for `Status` errors, `None` for codec failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by a full request round-trip.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The host could not be reached. Display is the transport's own message.
    #[error("{0}")]
    Connectivity(#[source] TransportError),
}

impl RequestError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RequestError::Connectivity(_))
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            RequestError::Api(err) => Some(err),
            RequestError::Connectivity(_) => None,
        }
    }
}

/// Client-side, field-scoped input error. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Configuration could not be read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable error: {0}")]
    Env(#[from] envy::Error),
}
