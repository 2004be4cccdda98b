//! Persistent storage backends for the admin credential.
//!
//! Two independent kinds of storage back the token:
//! - `KeyValueStore`: the primary store (a JSON file, the OS keychain, or memory)
//! - `CookieJar`: an expiring cookie mirror, also sent to the server on requests
//!
//! Backends report failures as `StorageError`; it is up to callers to decide
//! whether a failure matters. `TokenStore` treats every failure as "no token".

pub mod cookie;
pub mod error;
pub mod file;
pub mod keychain;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

use crate::config::{Config, StorageBackend};

pub use cookie::{SameSite, StoredCookie};
pub use error::StorageError;
pub use file::{FileCookieJar, FileStore};
pub use keychain::KeyringStore;

/// Primary key-value storage for the credential.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Cookie storage. Readers never see expired cookies.
pub trait CookieJar: Send + Sync {
    /// Insert or replace the cookie with the same name. Writing an expired
    /// cookie deletes it.
    fn set_cookie(&self, cookie: StoredCookie) -> Result<(), StorageError>;
    fn get_cookie(&self, name: &str) -> Result<Option<StoredCookie>, StorageError>;
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Vec<StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryCookieJar {
    fn set_cookie(&self, cookie: StoredCookie) -> Result<(), StorageError> {
        let mut cookies = lock(&self.cookies);
        cookie::upsert(&mut cookies, cookie);
        Ok(())
    }

    fn get_cookie(&self, name: &str) -> Result<Option<StoredCookie>, StorageError> {
        Ok(cookie::find_live(&lock(&self.cookies), name))
    }
}

/// Open the storage backends selected in the configuration.
pub fn open(config: &Config) -> Result<(Arc<dyn KeyValueStore>, Arc<dyn CookieJar>)> {
    match config.storage {
        StorageBackend::Memory => Ok((
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCookieJar::new()),
        )),
        StorageBackend::File => {
            let dir = Config::storage_dir()?;
            Ok((
                Arc::new(FileStore::new(dir.clone())),
                Arc::new(FileCookieJar::new(dir)),
            ))
        }
        StorageBackend::Keyring => {
            let dir = Config::storage_dir()?;
            Ok((Arc::new(KeyringStore::new()), Arc::new(FileCookieJar::new(dir))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_jar_hides_expired_cookie() {
        let jar = MemoryCookieJar::new();
        jar.set_cookie(StoredCookie::mirror("admin_token", "a.b.c"))
            .unwrap();
        assert!(jar.get_cookie("admin_token").unwrap().is_some());

        jar.set_cookie(StoredCookie::expired("admin_token")).unwrap();
        assert!(jar.get_cookie("admin_token").unwrap().is_none());
    }
}
