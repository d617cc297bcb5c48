//! Centralized configuration for courier.
//!
//! Constants for the transport, the loading overlay, client-side storage and
//! the user-facing message table. Per-request behavior lives in
//! [`crate::options`].

use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &'static str = concat!("courier/", env!("CARGO_PKG_VERSION"));
    pub const BASE_URL_ENV: &'static str = "COURIER_BASE_URL";
    /// Header carrying the auth token.
    pub const TOKEN_HEADER: &'static str = "token";
    /// Business code that marks a payload as successful.
    pub const SUCCESS_CODE: i64 = 200;
    /// Codes (HTTP or business) that are never retried.
    pub const NON_RETRYABLE_CODES: [i64; 2] = [401, 402];
}

/// Request option fallbacks used when neither the call site nor the
/// orchestrator supplies a value.
pub struct RequestDefaults;

impl RequestDefaults {
    pub const RETRY: u32 = 1;
    pub const RETRY_DELAY: Duration = Duration::from_millis(301);
    /// Floor applied to a zero retry delay.
    pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);
    pub const LOADING_TARGET: &'static str = "body";
}

/// Loading overlay timing.
pub struct LoadingConfig;

impl LoadingConfig {
    pub const HIDE_DEBOUNCE: Duration = Duration::from_millis(300);
    pub const SPINNER_TICK: Duration = Duration::from_millis(80);
}

/// Client-side key-value storage.
pub struct StorageConfig;

impl StorageConfig {
    pub const APP_DIR_NAME: &'static str = "courier";
    pub const STORAGE_FILENAME: &'static str = "storage.json";
    pub const TOKEN_KEY: &'static str = "token";
}

/// User-facing messages.
pub struct MessageConfig;

impl MessageConfig {
    pub const SUCCESS_FALLBACK: &'static str = "Operation succeeded";
    pub const ERROR_FALLBACK: &'static str = "Operation failed, the network may be unstable";
    pub const GENERIC_FAILURE: &'static str = "Operation failed";
    pub const PERMISSION_DENIED: &'static str = "Permission denied";
    pub const ENDPOINT_NOT_FOUND: &'static str = "Endpoint not found";
    pub const NOTICE_TITLE: &'static str = "Notice";

    /// Fixed message table for HTTP statuses.
    pub fn for_status(status: u16) -> &'static str {
        match status {
            400 => Self::PERMISSION_DENIED,
            404 => Self::ENDPOINT_NOT_FOUND,
            _ => Self::GENERIC_FAILURE,
        }
    }

    /// Overlay text for a given retry attempt (0 = first dispatch).
    pub fn loading_text(attempt: u32) -> String {
        if attempt == 0 {
            "Loading, please wait".to_string()
        } else {
            format!("Retry attempt {} in progress, please wait", attempt)
        }
    }
}
