pub mod claims;
pub mod cookie_provider;
pub mod keyring_storage;
pub mod secure_storage_trait;
pub mod session_store;
pub mod token_introspection;
pub mod token_persistence;

pub use claims::{Claims, User};
pub use cookie_provider::SessionCookieProvider;
pub use keyring_storage::KeyringTokenStorage;
pub use secure_storage_trait::{SameSite, StoredToken, TokenStorage};
pub use session_store::{Clock, CookieAttributes, InitOutcome, Session, SessionStore, SystemClock};
pub use token_introspection::{TokenError, decode_claims};
pub use token_persistence::{FileTokenStorage, MemoryTokenStorage};

use crate::config::{RuntimeConfig, StorageBackend};
use log::info;
use std::sync::Arc;

/// Instantiate the storage backend selected by configuration
pub fn storage_for(backend: &StorageBackend) -> Arc<dyn TokenStorage> {
    match backend {
        StorageBackend::Memory => {
            info!("Session token kept in memory only");
            Arc::new(MemoryTokenStorage::new())
        }
        StorageBackend::File(path) => {
            info!("Session token persisted to {}", path.display());
            Arc::new(FileTokenStorage::new(path))
        }
        StorageBackend::Keyring => {
            info!("Session token persisted to the OS keyring");
            Arc::new(KeyringTokenStorage::default())
        }
    }
}

/// Build the session store for a runtime configuration
pub fn session_store_for(config: &RuntimeConfig) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        storage_for(&config.storage),
        CookieAttributes::for_config(config),
    ))
}
