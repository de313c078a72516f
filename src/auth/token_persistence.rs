use super::secure_storage_trait::{StoredToken, TokenStorage};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use log::{debug, error};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Session-only storage; entries live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: RwLock<HashMap<String, StoredToken>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn set_item(&self, key: &str, token: &StoredToken) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|e| {
            error!("Failed to acquire write lock on session storage: {}", e);
            AppError::StorageError(format!("Failed to write session token: {}", e))
        })?;
        entries.insert(key.to_string(), token.clone());
        debug!("Token '{}' saved to session storage", key);
        Ok(())
    }

    fn get_item(&self, key: &str) -> AppResult<Option<StoredToken>> {
        let mut entries = self.entries.write().map_err(|e| {
            error!("Failed to acquire lock on session storage: {}", e);
            AppError::StorageError(format!("Failed to read session token: {}", e))
        })?;

        let now = Utc::now().timestamp();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.clone())),
            Some(_) => {
                debug!("Token '{}' in session storage passed its retention window", key);
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|e| {
            error!("Failed to acquire write lock on session storage: {}", e);
            AppError::StorageError(format!("Failed to clear session token: {}", e))
        })?;
        if entries.remove(key).is_some() {
            debug!("Token '{}' cleared from session storage", key);
        }
        Ok(())
    }
}

/// Cookie jar persisted as a JSON map of entry name to [`StoredToken`].
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jar(&self) -> AppResult<HashMap<String, StoredToken>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                error!("Cookie jar at {} is corrupt: {}", self.path.display(), e);
                AppError::StorageError(format!("Failed to parse cookie jar: {}", e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to read cookie jar {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_jar(&self, jar: &HashMap<String, StoredToken>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(jar)?)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::StorageError(format!(
                "Failed to replace cookie jar {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn guard(&self) -> AppResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| AppError::StorageError(format!("Cookie jar lock poisoned: {}", e)))
    }
}

impl TokenStorage for FileTokenStorage {
    fn set_item(&self, key: &str, token: &StoredToken) -> AppResult<()> {
        let _guard = self.guard()?;
        let mut jar = self.read_jar().unwrap_or_else(|_| HashMap::new());
        jar.insert(key.to_string(), token.clone());
        self.write_jar(&jar)?;
        debug!("Token '{}' saved to cookie jar {}", key, self.path.display());
        Ok(())
    }

    fn get_item(&self, key: &str) -> AppResult<Option<StoredToken>> {
        let _guard = self.guard()?;
        let mut jar = self.read_jar()?;
        let now = Utc::now().timestamp();

        match jar.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.clone())),
            Some(_) => {
                debug!("Token '{}' in cookie jar passed its retention window", key);
                jar.remove(key);
                self.write_jar(&jar)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        let _guard = self.guard()?;
        // An unreadable jar holds nothing worth keeping
        let (mut jar, corrupt) = match self.read_jar() {
            Ok(jar) => (jar, false),
            Err(_) => (HashMap::new(), true),
        };

        if jar.remove(key).is_some() || corrupt {
            self.write_jar(&jar)?;
            debug!("Token '{}' cleared from cookie jar", key);
        } else {
            debug!("No token '{}' found to clear in cookie jar (already empty)", key);
        }
        Ok(())
    }
}
