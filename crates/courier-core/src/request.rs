//! Call-site description of a logical request.

use crate::network::request_key;
use crate::options::{LoadingSetting, NoticeMode, RequestOptions};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A request as issued by application code.
///
/// # Example
///
/// ```
/// use courier_core::ApiRequest;
/// use serde_json::json;
///
/// let request = ApiRequest::post("/api/orders")
///     .json(json!({"sku": "A-1", "qty": 2}))
///     .retry(2)
///     .loading("#orders");
/// assert_eq!(request.options().retry, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    url: String,
    query: BTreeMap<String, String>,
    body: Option<Value>,
    options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: BTreeMap::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json_from<T: Serialize>(self, body: &T) -> crate::Result<Self> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn native_data(mut self) -> Self {
        self.options.native_data = Some(true);
        self
    }

    pub fn success_mode(mut self, mode: NoticeMode) -> Self {
        self.options.success_mode = Some(mode);
        self
    }

    pub fn error_mode(mut self, mode: NoticeMode) -> Self {
        self.options.error_mode = Some(mode);
        self
    }

    pub fn repeat_request(mut self, repeat: bool) -> Self {
        self.options.repeat_request = Some(repeat);
        self
    }

    pub fn loading(mut self, loading: impl Into<LoadingSetting>) -> Self {
        self.options.loading = Some(loading.into());
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.options.retry = Some(retry);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.options.retry_delay = Some(delay);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Dedup key of this request.
    pub fn key(&self) -> String {
        request_key(&self.method, &self.url, self.body.as_ref())
    }
}
