//! Builder for configuring an [`HttpOrchestrator`].

use super::HttpOrchestrator;
use crate::config::{LoadingConfig, NetworkConfig};
use crate::network::{DynTransport, LoadingCoordinator, RequestKeyRegistry, RetryPolicy};
use crate::notify::{DynNotifier, DynOverlay, NoopOverlay, TracingNotifier};
use crate::options::RequestOptions;
use crate::storage::DynTokenStore;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring an orchestrator.
///
/// # Example
///
/// ```rust,ignore
/// use courier_core::{HttpOrchestrator, ReqwestTransport, RequestOptions};
/// use std::sync::Arc;
///
/// let transport = ReqwestTransport::new()?.with_base_url("https://api.example.com")?;
/// let orchestrator = HttpOrchestrator::builder(Arc::new(transport))
///     .defaults(RequestOptions::new().with_retry(2))
///     .build();
/// ```
pub struct HttpOrchestratorBuilder {
    transport: DynTransport,
    notifier: Option<DynNotifier>,
    overlay: Option<DynOverlay>,
    token_store: Option<DynTokenStore>,
    defaults: RequestOptions,
    retry_policy: RetryPolicy,
    loading_debounce: Duration,
    timeout: Duration,
}

impl HttpOrchestratorBuilder {
    pub fn new(transport: DynTransport) -> Self {
        Self {
            transport,
            notifier: None,
            overlay: None,
            token_store: None,
            defaults: RequestOptions::default(),
            retry_policy: RetryPolicy::default(),
            loading_debounce: LoadingConfig::HIDE_DEBOUNCE,
            timeout: NetworkConfig::REQUEST_TIMEOUT,
        }
    }

    /// Where success and error messages go.
    ///
    /// Default: [`TracingNotifier`]
    pub fn notifier(mut self, notifier: DynNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The overlay driven by the loading counter.
    ///
    /// Default: [`NoopOverlay`]
    pub fn overlay(mut self, overlay: DynOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Source of the auth token sent in the `token` header.
    ///
    /// Default: none (no header is sent)
    pub fn token_store(mut self, store: DynTokenStore) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Instance-level option defaults, overridden per call.
    pub fn defaults(mut self, defaults: RequestOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Quiet period before the overlay closes.
    ///
    /// Default: 300ms
    pub fn loading_debounce(mut self, debounce: Duration) -> Self {
        self.loading_debounce = debounce;
        self
    }

    /// Per-attempt timeout handed to the transport.
    ///
    /// Default: 10s
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> HttpOrchestrator {
        let overlay = self.overlay.unwrap_or_else(|| Arc::new(NoopOverlay));
        HttpOrchestrator {
            transport: self.transport,
            registry: RequestKeyRegistry::new(),
            loading: LoadingCoordinator::with_debounce(overlay, self.loading_debounce),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            token_store: self.token_store,
            defaults: self.defaults,
            retry_policy: self.retry_policy,
            timeout: self.timeout,
        }
    }
}
