//! Client-side key-value storage for the auth token.
//!
//! The orchestrator reads the `token` key on every dispatch and never writes
//! it. Writing is left to whoever owns the login flow.

use crate::config::StorageConfig;
use crate::error::{CourierError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Source of the auth token attached to outgoing requests.
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` when the user is not signed in.
    fn token(&self) -> Option<String>;
}

pub type DynTokenStore = Arc<dyn TokenStore>;

/// In-memory token holder.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }
}

/// Token store backed by a JSON object on disk.
///
/// The file is re-read on every lookup so a token written by another
/// process is picked up by the next request.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data dir>/courier/storage.json`.
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir().ok_or_else(|| CourierError::Config {
            message: "no data directory available on this platform".to_string(),
        })?;
        Ok(Self::new(
            base.join(StorageConfig::APP_DIR_NAME)
                .join(StorageConfig::STORAGE_FILENAME),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a string value from the store.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.load()?;
        Ok(entries.get(key).and_then(Value::as_str).map(str::to_string))
    }

    /// Write a string value, creating the file if needed.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.save(&entries)
    }

    /// Remove a key. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.set(StorageConfig::TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.remove(StorageConfig::TOKEN_KEY)
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(CourierError::io_with_path(e, &self.path)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(CourierError::Config {
                message: format!("{} does not contain a JSON object", self.path.display()),
            }),
        }
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CourierError::io_with_path(e, parent))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content).map_err(|e| CourierError::io_with_path(e, &self.path))
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.get(StorageConfig::TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read token from {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
