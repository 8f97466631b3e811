//! Raw session store interface and its in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

/// Errors from the session store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing lock was poisoned by a panicking writer.
    #[error("Session store lock poisoned")]
    Poisoned,

    /// A value could not be encoded as JSON.
    #[error("Failed to encode session value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed store scoped to one enrollment session.
///
/// Values are JSON text. Each stage writes only the keys it owns; nothing
/// here enforces that, callers do.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// [`SessionStore`] held in process memory for the lifetime of a session.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
