use super::secure_storage_trait::{StoredToken, TokenStorage};
use crate::constants::SERVICE_NAME_FOR_KEYRING;
use crate::error::{AppError, AppResult};
use chrono::Utc;
use keyring::{Entry, Error as KeyringError};
use log::{debug, error};

/// Stores each entry as a JSON-encoded credential in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringTokenStorage {
    service: String,
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new(SERVICE_NAME_FOR_KEYRING)
    }
}

impl KeyringTokenStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> AppResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| {
            error!("Failed to create keyring entry - OS: {:?}, Error: {}", std::env::consts::OS, e);
            AppError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn set_item(&self, key: &str, token: &StoredToken) -> AppResult<()> {
        let entry = self.entry(key)?;
        let encoded = serde_json::to_string(token)?;
        entry.set_password(&encoded).map_err(|e| {
            error!(
                "Failed to store token in keyring - OS: {:?}, Error: {}",
                std::env::consts::OS,
                e
            );
            AppError::KeyringError(format!("Failed to store token: {}", e))
        })?;
        debug!("Token '{}' saved to keyring", key);
        Ok(())
    }

    fn get_item(&self, key: &str) -> AppResult<Option<StoredToken>> {
        let entry = self.entry(key)?;
        let encoded = match entry.get_password() {
            Ok(encoded) => encoded,
            Err(KeyringError::NoEntry) => {
                debug!("No token entry '{}' found in keyring", key);
                return Ok(None);
            }
            Err(e) => {
                error!(
                    "Keyring error - OS: {:?}, Error type: {:?}, Details: {}",
                    std::env::consts::OS,
                    e,
                    e
                );
                return Err(AppError::KeyringError(format!(
                    "Failed to retrieve token from keyring: {}",
                    e
                )));
            }
        };

        let stored: StoredToken = serde_json::from_str(&encoded).map_err(|e| {
            AppError::StorageError(format!("Keyring entry '{}' is not a stored token: {}", key, e))
        })?;

        if stored.is_live(Utc::now().timestamp()) {
            Ok(Some(stored))
        } else {
            debug!("Token '{}' in keyring passed its retention window", key);
            self.remove_item(key)?;
            Ok(None)
        }
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        let entry = self.entry(key)?;
        match entry.delete_credential() {
            Ok(()) => {
                debug!("Token '{}' cleared from keyring", key);
                Ok(())
            }
            Err(KeyringError::NoEntry) => {
                debug!("No token '{}' found to clear in keyring (already empty)", key);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to clear token from keyring - OS: {:?}, Error: {}",
                    std::env::consts::OS,
                    e
                );
                Err(AppError::KeyringError(format!("Failed to clear token: {}", e)))
            }
        }
    }
}
