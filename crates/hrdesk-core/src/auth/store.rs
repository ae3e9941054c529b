//! Persistent key-value storage for the session pair.
//!
//! The session is persisted as two independent entries, the bearer token
//! and a serialized user snapshot. They are always written and cleared
//! together through [`save_pair`] and [`clear_pair`]; [`load_pair`] treats
//! a store holding only one of them as empty and removes the orphan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use keyring::Entry;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::User;

/// Key under which the bearer token is stored
pub const TOKEN_KEY: &str = "access_token";

/// Key under which the user snapshot is stored
pub const USER_KEY: &str = "current_user";

/// Session file name inside the store directory
const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// A client-local persistent key-value store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// What survived from a previous run.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub token: String,
    /// `None` when the snapshot entry exists but could not be parsed
    pub user: Option<User>,
}

/// Persist token and user together. On failure neither entry is left behind.
pub fn save_pair(store: &mut dyn KeyValueStore, token: &str, user: &User) -> Result<(), StoreError> {
    let snapshot = serde_json::to_string(user)?;
    let result = store
        .set(USER_KEY, &snapshot)
        .and_then(|_| store.set(TOKEN_KEY, token));
    if let Err(e) = result {
        warn!(error = %e, "Failed to persist session, rolling back");
        if let Err(cleanup) = clear_pair(store) {
            warn!(error = %cleanup, "Rollback of partial session failed");
        }
        return Err(e);
    }
    Ok(())
}

/// Replace only the user snapshot of an existing pair.
pub fn save_user(store: &mut dyn KeyValueStore, user: &User) -> Result<(), StoreError> {
    let snapshot = serde_json::to_string(user)?;
    store.set(USER_KEY, &snapshot)
}

/// Load the persisted pair, if both halves are present.
pub fn load_pair(store: &mut dyn KeyValueStore) -> Result<Option<StoredSession>, StoreError> {
    let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
    let snapshot = store.get(USER_KEY)?;

    match (token, snapshot) {
        (Some(token), Some(snapshot)) => {
            let user = match serde_json::from_str(&snapshot) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable user snapshot");
                    None
                }
            };
            Ok(Some(StoredSession { token, user }))
        }
        (None, None) => Ok(None),
        (token, _) => {
            warn!(has_token = token.is_some(), "Found half a session in storage, clearing it");
            clear_pair(store)?;
            Ok(None)
        }
    }
}

/// Remove both entries. Both removals are attempted even if the first fails.
pub fn clear_pair(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    let token_result = store.remove(TOKEN_KEY);
    let user_result = store.remove(USER_KEY);
    token_result.and(user_result)
}

// ============================================================================
// File store
// ============================================================================

/// JSON map persisted to `<dir>/session.json`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!(key, path = ?self.path, "Stored entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            // An unreadable file can't be partially cleared; drop it.
            Err(StoreError::Corrupt(_)) => {
                std::fs::remove_file(&self.path)?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ============================================================================
// Keyring store
// ============================================================================

/// Entries in the OS keychain, one keychain item per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// Process-local store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}
