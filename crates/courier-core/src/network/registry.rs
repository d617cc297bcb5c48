//! Pending-request registry for duplicate suppression.
//!
//! Each logical request gets a key built from its method, URL and body. At
//! most one request per key is in flight: registering a key that is already
//! pending cancels the older request and takes its slot.

use crate::cancel::CancellationToken;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Build the dedup key for a request.
///
/// The body is serialized canonically (object keys sorted at every level),
/// so property order does not influence the key.
pub fn request_key(method: &Method, url: &str, body: Option<&Value>) -> String {
    let body = body.map(canonical_json).unwrap_or_default();
    format!("{}{}?{}", method.as_str().to_uppercase(), url, body)
}

fn canonical_json(value: &Value) -> String {
    // Routed through a BTreeMap so keys come out sorted even when serde_json
    // is built with `preserve_order`.
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), sort(v)))
                    .collect::<std::collections::BTreeMap<_, _>>()
                    .into_iter()
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

#[derive(Debug)]
struct PendingEntry {
    id: Uuid,
    token: CancellationToken,
}

/// Tracks the cancellation handle of every in-flight keyed request.
#[derive(Debug, Clone, Default)]
pub struct RequestKeyRegistry {
    entries: Arc<Mutex<HashMap<String, PendingEntry>>>,
}

impl RequestKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request under `key`, superseding any pending duplicate.
    ///
    /// The returned guard releases the entry when dropped.
    pub fn register(&self, key: impl Into<String>) -> PendingGuard {
        let key = key.into();
        let id = Uuid::new_v4();
        let token = CancellationToken::new();

        let mut entries = self.lock();
        if let Some(previous) = entries.remove(&key) {
            debug!(key = %key, superseded = %previous.id, "Cancelling duplicate request");
            previous.token.cancel();
        }
        entries.insert(
            key.clone(),
            PendingEntry {
                id,
                token: token.clone(),
            },
        );

        PendingGuard {
            registry: self.clone(),
            key,
            id,
            token,
        }
    }

    /// Cancel and evict the pending request for `key`, if any.
    pub fn cancel_if_pending(&self, key: &str) -> bool {
        match self.lock().remove(key) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `key` if it still belongs to request `id`.
    ///
    /// A request that was superseded no longer owns the slot, so its release
    /// leaves the newer entry in place.
    pub fn release(&self, key: &str, id: Uuid) -> bool {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.id == id => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingEntry>> {
        // Entries stay consistent even if a holder panicked mid-update.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Ownership of a registry slot for the duration of one dispatch.
#[derive(Debug)]
pub struct PendingGuard {
    registry: RequestKeyRegistry,
    key: String,
    id: Uuid,
    token: CancellationToken,
}

impl PendingGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Abort signal for the transport call.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ignores_property_order() {
        let a = json!({"page": 1, "filter": {"b": 2, "a": 1}});
        let b = json!({"filter": {"a": 1, "b": 2}, "page": 1});
        assert_eq!(
            request_key(&Method::POST, "/api/list", Some(&a)),
            request_key(&Method::POST, "/api/list", Some(&b))
        );
    }

    #[test]
    fn test_key_distinguishes_method_url_and_body() {
        let body = json!({"id": 1});
        let base = request_key(&Method::POST, "/api/item", Some(&body));
        assert_ne!(base, request_key(&Method::PUT, "/api/item", Some(&body)));
        assert_ne!(base, request_key(&Method::POST, "/api/other", Some(&body)));
        assert_ne!(
            base,
            request_key(&Method::POST, "/api/item", Some(&json!({"id": 2})))
        );
        assert_eq!(request_key(&Method::GET, "/api/weather", None), "GET/api/weather?");
    }

    #[test]
    fn test_register_supersedes_pending_duplicate() {
        let registry = RequestKeyRegistry::new();
        let first = registry.register("k");
        let second = registry.register("k");

        assert!(first.token().is_cancelled());
        assert!(!second.token().is_cancelled());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_superseded_release_keeps_replacement() {
        let registry = RequestKeyRegistry::new();
        let first = registry.register("k");
        let second = registry.register("k");

        drop(first);
        assert!(registry.contains("k"));

        drop(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_requires_matching_id() {
        let registry = RequestKeyRegistry::new();
        let guard = registry.register("k");
        assert!(!registry.release("k", Uuid::new_v4()));
        assert!(registry.release("k", guard.id()));
        assert!(!registry.contains("k"));
    }

    #[test]
    fn test_cancel_if_pending() {
        let registry = RequestKeyRegistry::new();
        assert!(!registry.cancel_if_pending("k"));

        let guard = registry.register("k");
        assert!(registry.cancel_if_pending("k"));
        assert!(guard.token().is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_distinct_keys_coexist() {
        let registry = RequestKeyRegistry::new();
        let a = registry.register("a");
        let b = registry.register("b");
        assert_eq!(registry.len(), 2);
        assert!(!a.token().is_cancelled());
        assert!(!b.token().is_cancelled());
    }
}
