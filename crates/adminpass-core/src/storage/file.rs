use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use super::cookie::{self as cookies, StoredCookie};
use super::{lock, CookieJar, KeyValueStore, StorageError};

/// Key-value file name in the storage directory
const STORE_FILE: &str = "storage.json";

/// Cookie file name in the storage directory
const COOKIE_FILE: &str = "cookies.json";

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&contents)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Key-value store persisted as a single JSON object.
///
/// Every operation re-reads the file, so separate processes sharing the
/// directory see each other's writes. The mutex only orders writers inside
/// this process.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(STORE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries: BTreeMap<String, String> = read_json(&self.path)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = lock(&self.write_lock);
        let mut entries: BTreeMap<String, String> = read_json(&self.path)?;
        entries.insert(key.to_string(), value.to_string());
        write_json(&self.path, &entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = lock(&self.write_lock);
        let mut entries: BTreeMap<String, String> = read_json(&self.path)?;
        if entries.remove(key).is_some() {
            write_json(&self.path, &entries)?;
        }
        Ok(())
    }
}

/// Cookie jar persisted as a JSON array. Expired cookies are pruned on write.
pub struct FileCookieJar {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(COOKIE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CookieJar for FileCookieJar {
    fn set_cookie(&self, cookie: StoredCookie) -> Result<(), StorageError> {
        let _guard = lock(&self.write_lock);
        let mut stored: Vec<StoredCookie> = read_json(&self.path)?;
        cookies::upsert(&mut stored, cookie);
        write_json(&self.path, &stored)
    }

    fn get_cookie(&self, name: &str) -> Result<Option<StoredCookie>, StorageError> {
        let stored: Vec<StoredCookie> = read_json(&self.path)?;
        Ok(cookies::find_live(&stored, name))
    }
}
