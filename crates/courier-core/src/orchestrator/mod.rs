//! The request orchestrator.
//!
//! [`HttpOrchestrator::send`] drives one logical request through its whole
//! lifecycle: option resolution, duplicate suppression, the loading overlay,
//! the transport call, response classification, retries and the final user
//! notification.

mod builder;

pub use builder::HttpOrchestratorBuilder;

use crate::config::{MessageConfig, NetworkConfig};
use crate::cancel::CancellationToken;
use crate::error::{payload_message, CourierError, Result};
use crate::network::{
    DynTransport, LoadingCoordinator, RequestKeyRegistry, RetryPolicy, RetryStats,
    TransportRequest, TransportResponse,
};
use crate::notify::DynNotifier;
use crate::options::{RequestOptions, ResolvedOptions};
use crate::request::ApiRequest;
use crate::storage::DynTokenStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends requests on behalf of application code.
///
/// All shared state (pending keys, loading counter) lives in the
/// orchestrator instance, so independent instances never interfere.
pub struct HttpOrchestrator {
    transport: DynTransport,
    registry: RequestKeyRegistry,
    loading: LoadingCoordinator,
    notifier: DynNotifier,
    token_store: Option<DynTokenStore>,
    defaults: RequestOptions,
    retry_policy: RetryPolicy,
    timeout: Duration,
}

impl HttpOrchestrator {
    /// Start configuring an orchestrator on top of `transport`.
    pub fn builder(transport: DynTransport) -> HttpOrchestratorBuilder {
        HttpOrchestratorBuilder::new(transport)
    }

    pub fn registry(&self) -> &RequestKeyRegistry {
        &self.registry
    }

    pub fn loading(&self) -> &LoadingCoordinator {
        &self.loading
    }

    /// Instance-level option defaults.
    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Effective options of `request` on this instance.
    pub fn resolve(&self, request: &ApiRequest) -> ResolvedOptions {
        ResolvedOptions::resolve(request.options(), &self.defaults)
    }

    /// Send `request` and return its payload.
    ///
    /// Resolves with the full response body on business success (or with
    /// the raw body when `native_data` is set). A request replaced by a newer
    /// duplicate ends with [`CourierError::Superseded`] and is never
    /// notified.
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let options = self.resolve(&request);
        let key = request.key();

        // Held for the whole chain, retry waits included.
        let pending = (!options.repeat_request).then(|| self.registry.register(key.as_str()));
        let cancel = pending
            .as_ref()
            .map(|guard| guard.token())
            .unwrap_or_default();

        let mut stats = RetryStats {
            attempts: 1,
            ..RetryStats::default()
        };
        let mut retry_count = 0u32;

        loop {
            let error = match self.dispatch(&request, &options, &key, &cancel, retry_count).await {
                Ok(payload) => {
                    if stats.retries() > 0 {
                        debug!(
                            "{} {} succeeded after {} retries ({:?} waiting)",
                            request.method(),
                            request.url(),
                            stats.retries(),
                            stats.total_delay
                        );
                    }
                    return Ok(payload);
                }
                Err(e) => e,
            };

            if error.is_cancelled() {
                debug!("{} {} superseded, dropping silently", request.method(), request.url());
                return Err(error);
            }

            if self.retry_policy.should_retry(&error, retry_count, &options) {
                let delay = self.retry_policy.next_delay(&options);
                retry_count += 1;
                warn!(
                    "Attempt {}/{} for {} {} failed: {}. Retrying in {:?}",
                    retry_count,
                    options.retry + 1,
                    request.method(),
                    request.url(),
                    error,
                    delay
                );
                stats.record_retry(delay);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("{} {} superseded while waiting to retry", request.method(), request.url());
                        return Err(CourierError::Superseded { key });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            self.notifier
                .notify_error(&error.user_message(), options.error_mode);
            return Err(error);
        }
    }

    /// Send `request` and deserialize the payload into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let payload = self.send(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// One transport attempt under the chain's abort signal, holding the
    /// loading overlay while it runs.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        options: &ResolvedOptions,
        key: &str,
        cancel: &CancellationToken,
        attempt: u32,
    ) -> Result<Value> {
        let superseded = || CourierError::Superseded {
            key: key.to_string(),
        };
        if cancel.is_cancelled() {
            return Err(superseded());
        }

        let loading = options
            .loading_target
            .as_deref()
            .map(|target| self.loading.show(target, attempt));

        debug!(key = %key, attempt, "Dispatching request");
        let result = self
            .transport
            .send(self.transport_request(request), cancel.clone())
            .await;
        drop(loading);

        if cancel.is_cancelled() {
            return Err(superseded());
        }
        match result {
            Ok(response) => self.settle(response, options),
            Err(CourierError::Cancelled) => Err(superseded()),
            Err(e) => Err(e),
        }
    }

    fn transport_request(&self, request: &ApiRequest) -> TransportRequest {
        let mut outgoing = TransportRequest::new(request.method().clone(), request.url());
        outgoing.query = request.query_params().clone();
        outgoing.body = request.body().cloned();
        outgoing.timeout = self.timeout;
        if let Some(token) = self.token_store.as_ref().and_then(|store| store.token()) {
            outgoing
                .headers
                .push((NetworkConfig::TOKEN_HEADER.to_string(), token));
        }
        outgoing
    }

    /// Classify a completed exchange.
    fn settle(&self, response: TransportResponse, options: &ResolvedOptions) -> Result<Value> {
        if !response.is_success() {
            let message = reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Unknown status")
                .to_string();
            return Err(CourierError::Status {
                status: response.status,
                message,
                body: (!response.body.is_null()).then_some(response.body),
            });
        }

        if options.native_data {
            return Ok(response.body);
        }

        let body = response.body;
        let code = body.get("code").and_then(Value::as_i64);
        if code == Some(NetworkConfig::SUCCESS_CODE) {
            let message = payload_message(&body)
                .unwrap_or_else(|| MessageConfig::SUCCESS_FALLBACK.to_string());
            self.notifier.notify_success(&message, options.success_mode);
            Ok(body)
        } else {
            Err(CourierError::Business {
                code,
                message: payload_message(&body).unwrap_or_default(),
                payload: body,
            })
        }
    }
}

impl std::fmt::Debug for HttpOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOrchestrator")
            .field("registry", &self.registry)
            .field("loading", &self.loading)
            .field("defaults", &self.defaults)
            .field("retry_policy", &self.retry_policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
