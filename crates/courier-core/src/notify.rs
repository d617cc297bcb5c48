//! Presentation ports: user notifications and the global loading overlay.
//!
//! The orchestrator only ever talks to these traits. A terminal front end,
//! a GUI shell or a test double supplies the implementation.

use crate::config::MessageConfig;
use crate::options::NoticeMode;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Displays success and error messages.
///
/// `mode` says how the message should be presented; implementations are
/// expected to show nothing for [`NoticeMode::Hidden`] and [`NoticeMode::Null`].
pub trait NotificationPort: Send + Sync {
    fn notify_success(&self, message: &str, mode: NoticeMode);

    fn notify_error(&self, message: &str, mode: NoticeMode);
}

/// A single blocking overlay bound to a target selector.
pub trait LoadingOverlay: Send + Sync {
    /// Open the overlay. `attempt` is 0 for a first dispatch and N for the
    /// Nth retry.
    fn open(&self, target: &str, attempt: u32);

    fn close(&self);
}

pub type DynNotifier = Arc<dyn NotificationPort>;
pub type DynOverlay = Arc<dyn LoadingOverlay>;

/// Notification port that writes to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify_success(&self, message: &str, mode: NoticeMode) {
        if mode.is_visible() {
            info!(mode = %mode, "{}", message);
        }
    }

    fn notify_error(&self, message: &str, mode: NoticeMode) {
        if mode.is_visible() {
            error!(mode = %mode, "{}", message);
        }
    }
}

/// Overlay that only records its transitions in the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOverlay;

impl LoadingOverlay for NoopOverlay {
    fn open(&self, target: &str, attempt: u32) {
        debug!(target_selector = target, "{}", MessageConfig::loading_text(attempt));
    }

    fn close(&self) {
        debug!("Loading overlay closed");
    }
}
