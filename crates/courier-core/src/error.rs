//! Error types for the request pipeline.
//!
//! Every failure a call chain can end in is one variant of [`CourierError`].
//! The orchestrator uses the classification helpers here to decide between
//! retrying, notifying the user, or staying silent.

use crate::config::MessageConfig;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for courier.
#[derive(Debug, Error)]
pub enum CourierError {
    /// A newer identical request replaced this one while it was in flight.
    #[error("Request superseded by a newer duplicate: {key}")]
    Superseded { key: String },

    /// The transport observed its abort signal.
    #[error("Request was cancelled")]
    Cancelled,

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    /// Carries the limit that was hit when the producer knows it.
    #[error("Request timeout{}", .0.map(|d| format!(" after {:?}", d)).unwrap_or_default())]
    Timeout(Option<std::time::Duration>),

    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// Parsed response body, if any
        body: Option<Value>,
    },

    #[error("Decode error: {message}")]
    Decode { message: String },

    // Business errors
    #[error("Business error (code {code:?}): {message}")]
    Business {
        /// Business code from the payload; `None` when it has none
        code: Option<i64>,
        message: String,
        /// Full payload returned by the backend
        payload: Value,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Storage errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for courier operations.
pub type Result<T> = std::result::Result<T, CourierError>;

impl From<std::io::Error> for CourierError {
    fn from(err: std::io::Error) -> Self {
        CourierError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<crate::cancel::CancelledError> for CourierError {
    fn from(_: crate::cancel::CancelledError) -> Self {
        CourierError::Cancelled
    }
}

impl From<url::ParseError> for CourierError {
    fn from(err: url::ParseError) -> Self {
        CourierError::Config {
            message: format!("invalid URL: {}", err),
        }
    }
}

impl From<reqwest::Error> for CourierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // The error does not say which limit fired.
            CourierError::Timeout(None)
        } else if err.is_decode() {
            CourierError::Decode {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            CourierError::Config {
                message: err.to_string(),
            }
        } else {
            CourierError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl CourierError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CourierError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this is the outcome of a request replaced by a duplicate.
    pub fn is_superseded(&self) -> bool {
        matches!(self, CourierError::Superseded { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CourierError::Cancelled | CourierError::Superseded { .. })
    }

    /// Check if this error is a transport failure worth retrying.
    ///
    /// This is the error-side half of the decision; the retry budget and the
    /// non-retryable code set are applied by the retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CourierError::Network { .. } | CourierError::Timeout(_) | CourierError::Status { .. }
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CourierError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Business code carried by the error, if any.
    pub fn business_code(&self) -> Option<i64> {
        match self {
            CourierError::Business { code, .. } => *code,
            CourierError::Status {
                body: Some(body), ..
            } => body.get("code").and_then(Value::as_i64),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// A message embedded in the payload wins over the fixed status table.
    pub fn user_message(&self) -> String {
        match self {
            CourierError::Business {
                message, payload, ..
            } => payload_message(payload)
                .or_else(|| (!message.is_empty()).then(|| message.clone()))
                .unwrap_or_else(|| MessageConfig::ERROR_FALLBACK.to_string()),
            CourierError::Status { status, body, .. } => body
                .as_ref()
                .and_then(payload_message)
                .unwrap_or_else(|| MessageConfig::for_status(*status).to_string()),
            _ => MessageConfig::GENERIC_FAILURE.to_string(),
        }
    }
}

/// Extract the `msg` (or, failing that, `error`) field from a payload.
pub fn payload_message(payload: &Value) -> Option<String> {
    ["msg", "error"].iter().find_map(|field| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
