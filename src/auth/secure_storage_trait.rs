use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("Strict"),
            Self::Lax => f.write_str("Lax"),
            Self::None => f.write_str("None"),
        }
    }
}

/// A persisted token entry together with its cookie attributes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub value: String,
    /// Retention deadline (Unix seconds); the entry is gone after this instant
    pub expires_at: i64,
    pub same_site: SameSite,
    pub secure: bool,
}

impl StoredToken {
    pub const fn is_live(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

// Token values must never reach the logs
impl Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("same_site", &self.same_site)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Durable client-side storage for named token entries.
///
/// Implementations hide entries whose `expires_at` has passed, and removing a
/// missing key succeeds.
pub trait TokenStorage: Send + Sync + Debug {
    fn set_item(&self, key: &str, token: &StoredToken) -> AppResult<()>;
    fn get_item(&self, key: &str) -> AppResult<Option<StoredToken>>;
    fn remove_item(&self, key: &str) -> AppResult<()>;
}
