//! Per-request behavioral options and their resolution.
//!
//! Options can be given at the call site (on an [`crate::ApiRequest`]) or as
//! orchestrator-wide defaults. [`ResolvedOptions::resolve`] applies the
//! precedence call-site > orchestrator default > fallback, option by option.

use crate::config::RequestDefaults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How a success or error message is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeMode {
    /// Transient toast.
    Msg,
    /// Blocking modal.
    #[serde(rename = "msgbox")]
    MsgBox,
    /// Explicitly suppressed.
    Hidden,
    /// No presentation configured.
    Null,
}

impl NoticeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeMode::Msg => "msg",
            NoticeMode::MsgBox => "msgbox",
            NoticeMode::Hidden => "hidden",
            NoticeMode::Null => "null",
        }
    }

    /// Whether anything is shown to the user in this mode.
    pub fn is_visible(&self) -> bool {
        matches!(self, NoticeMode::Msg | NoticeMode::MsgBox)
    }
}

impl FromStr for NoticeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "msg" => Ok(NoticeMode::Msg),
            "msgbox" => Ok(NoticeMode::MsgBox),
            "hidden" => Ok(NoticeMode::Hidden),
            "null" => Ok(NoticeMode::Null),
            other => Err(format!("unknown notice mode: {}", other)),
        }
    }
}

impl fmt::Display for NoticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a request shows the loading overlay, and over which target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingSetting {
    Off,
    /// Enabled over the default target.
    On,
    /// Enabled over the given target selector.
    Target(String),
}

impl From<bool> for LoadingSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            LoadingSetting::On
        } else {
            LoadingSetting::Off
        }
    }
}

impl From<&str> for LoadingSetting {
    fn from(target: &str) -> Self {
        LoadingSetting::Target(target.to_string())
    }
}

/// Behavioral flags of a request. Unset fields defer to the next level of
/// precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Return the response body untouched, skipping business-code handling.
    pub native_data: Option<bool>,
    pub success_mode: Option<NoticeMode>,
    pub error_mode: Option<NoticeMode>,
    /// Allow identical requests to run concurrently instead of superseding.
    pub repeat_request: Option<bool>,
    pub loading: Option<LoadingSetting>,
    /// Retry budget: additional attempts after the first failure.
    pub retry: Option<u32>,
    pub retry_delay: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_data(mut self, native: bool) -> Self {
        self.native_data = Some(native);
        self
    }

    pub fn with_success_mode(mut self, mode: NoticeMode) -> Self {
        self.success_mode = Some(mode);
        self
    }

    pub fn with_error_mode(mut self, mode: NoticeMode) -> Self {
        self.error_mode = Some(mode);
        self
    }

    pub fn with_repeat_request(mut self, repeat: bool) -> Self {
        self.repeat_request = Some(repeat);
        self
    }

    pub fn with_loading(mut self, loading: impl Into<LoadingSetting>) -> Self {
        self.loading = Some(loading.into());
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }
}

/// Fully resolved options for one call chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub native_data: bool,
    pub success_mode: NoticeMode,
    pub error_mode: NoticeMode,
    pub repeat_request: bool,
    /// Overlay target, `None` when loading is off.
    pub loading_target: Option<String>,
    pub retry: u32,
    pub retry_delay: Duration,
}

impl ResolvedOptions {
    /// Resolve call-site options against orchestrator defaults.
    pub fn resolve(call_site: &RequestOptions, defaults: &RequestOptions) -> Self {
        let retry_delay = call_site
            .retry_delay
            .or(defaults.retry_delay)
            .unwrap_or(RequestDefaults::RETRY_DELAY)
            .max(RequestDefaults::MIN_RETRY_DELAY);

        Self {
            native_data: call_site.native_data.or(defaults.native_data).unwrap_or(false),
            success_mode: call_site
                .success_mode
                .or(defaults.success_mode)
                .unwrap_or(NoticeMode::Null),
            error_mode: call_site
                .error_mode
                .or(defaults.error_mode)
                .unwrap_or(NoticeMode::Msg),
            repeat_request: call_site
                .repeat_request
                .or(defaults.repeat_request)
                .unwrap_or(false),
            loading_target: resolve_loading(call_site.loading.as_ref(), defaults.loading.as_ref()),
            retry: call_site.retry.or(defaults.retry).unwrap_or(RequestDefaults::RETRY),
            retry_delay,
        }
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self::resolve(&RequestOptions::default(), &RequestOptions::default())
    }
}

fn resolve_loading(
    call_site: Option<&LoadingSetting>,
    defaults: Option<&LoadingSetting>,
) -> Option<String> {
    let default_target = match defaults {
        Some(LoadingSetting::Target(target)) => target.clone(),
        _ => RequestDefaults::LOADING_TARGET.to_string(),
    };

    match call_site.or(defaults) {
        Some(LoadingSetting::Off) => None,
        Some(LoadingSetting::Target(target)) => Some(target.clone()),
        Some(LoadingSetting::On) | None => Some(default_target),
    }
}
