//! HTTP transport seam and its reqwest implementation.
//!
//! A transport performs exactly one exchange: it sends the request, waits
//! for the status and body, and gives up early when its abort signal fires.
//! Classification, retries and notifications happen above it.

use crate::cancel::CancellationToken;
use crate::config::NetworkConfig;
use crate::error::{CourierError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One HTTP exchange as handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the transport's base URL, or an absolute URL.
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: BTreeMap::new(),
            body: None,
            headers: Vec::new(),
            timeout: NetworkConfig::REQUEST_TIMEOUT,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and parsed body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// A 200 response with the given body.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract HTTP client used by the orchestrator.
///
/// Implementations return `Ok` for any status the server answered with, and
/// must report an observed abort as [`CourierError::Cancelled`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse>;
}

pub type DynTransport = Arc<dyn Transport>;

/// Transport backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    /// Create a transport with the default per-request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a transport whose client enforces `timeout` on every request.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| CourierError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Create a transport using `COURIER_BASE_URL` as base URL when set.
    pub fn from_env() -> Result<Self> {
        let transport = Self::new()?;
        match std::env::var(NetworkConfig::BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => transport.with_base_url(&base),
            _ => Ok(transport),
        }
    }

    /// Prefix relative request URLs with `base`.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        Url::parse(base)?;
        self.base_url = Some(base.trim_end_matches('/').to_string());
        Ok(self)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Resolve a request URL against the base URL.
    ///
    /// Absolute URLs pass through untouched; relative ones are appended to
    /// the base path.
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        match &self.base_url {
            Some(base) => Ok(Url::parse(&format!(
                "{}/{}",
                base,
                url.trim_start_matches('/')
            ))?),
            None => Err(CourierError::Config {
                message: format!("relative URL {} used without a base URL", url),
            }),
        }
    }

    async fn exchange(&self, request: TransportRequest) -> Result<TransportResponse> {
        let url = self.resolve_url(&request.url)?;
        let timeout = request.timeout;

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                CourierError::Timeout(Some(timeout))
            } else {
                CourierError::from(e)
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_err)?;
        debug!("{} {} -> {}", request.method, url, status);

        Ok(TransportResponse::new(status, parse_body(&text)))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse> {
        cancel.check()?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CourierError::Cancelled),
            result = self.exchange(request) => result,
        }
    }
}

/// Parse a response body: empty is `null`, non-JSON text becomes a string.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
