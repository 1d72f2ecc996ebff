use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use log::{debug, warn};

const SERVICE: &str = "buzzzy_client";

/// Persisted session token
pub const TOKEN_KEY: &str = "buzzzy_token";
/// Persisted theme key
pub const THEME_KEY: &str = "buzzzy_theme";

/// Small persistent key-value storage for the session
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// OS keyring, with an opt-in plain file fallback for headless machines
pub struct KeyringStore {
    fallback_dir: Option<PathBuf>,
}

impl KeyringStore {
    /// `fallback_dir` is only used when set; without it a keyring failure is an error
    pub fn new(fallback_dir: Option<PathBuf>) -> Self {
        Self { fallback_dir }
    }

    fn fallback_path(&self, key: &str) -> Option<PathBuf> {
        self.fallback_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.txt", key)))
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Option<String> {
        let entry = Entry::new(SERVICE, key);
        match entry.get_password() {
            Ok(value) => {
                if value.trim().is_empty() {
                    None
                } else {
                    Some(value)
                }
            }
            Err(e) => {
                debug!("[SESSION_STORE] keyring read of {} failed: {}", key, e);
                let path = self.fallback_path(key)?;
                let value = fs::read_to_string(path).ok()?;
                let value = value.trim().to_string();
                (!value.is_empty()).then_some(value)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let entry = Entry::new(SERVICE, key);
        match entry.set_password(value) {
            Ok(()) => Ok(()),
            Err(e) => match self.fallback_path(key) {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, value)?;
                    // never log the value itself
                    warn!("[SESSION_STORE] keyring unavailable, persisted {} to fallback file", key);
                    Ok(())
                }
                None => Err(anyhow::anyhow!(
                    "keyring unavailable and file fallback disabled: {}",
                    e
                )),
            },
        }
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let entry = Entry::new(SERVICE, key);
        let _ = entry.delete_password();
        if let Some(path) = self.fallback_path(key) {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Process-local store, for tests and `--ephemeral` runs
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_forgets() {
        let store = MemoryStore::with(THEME_KEY, "crystal");
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("crystal"));
        store.set(TOKEN_KEY, "t0k").unwrap();
        store.remove(TOKEN_KEY).unwrap();
        assert!(store.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn fallback_files_are_named_after_the_key() {
        let store = KeyringStore::new(Some(PathBuf::from("data")));
        assert_eq!(
            store.fallback_path(TOKEN_KEY),
            Some(PathBuf::from("data").join("buzzzy_token.txt"))
        );
        assert!(KeyringStore::new(None).fallback_path(TOKEN_KEY).is_none());
    }
}
