use super::claims::{Claims, User};
use super::secure_storage_trait::{SameSite, StoredToken, TokenStorage};
use super::token_introspection::{self, TokenError};
use crate::config::RuntimeConfig;
use crate::constants::{AUTH_COOKIE_NAME, TOKEN_RETENTION_DAYS};
use chrono::Utc;
use log::{debug, info, warn};
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Source of the current Unix time in seconds
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Attributes applied when the token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieAttributes {
    pub retention_days: i64,
    pub same_site: SameSite,
    pub secure: bool,
}

impl CookieAttributes {
    pub const fn new(secure: bool) -> Self {
        Self {
            retention_days: TOKEN_RETENTION_DAYS,
            same_site: SameSite::Strict,
            secure,
        }
    }

    pub const fn for_config(config: &RuntimeConfig) -> Self {
        Self::new(config.secure_cookies())
    }
}

/// Process-local authentication state.
///
/// Either both token and user are present (authenticated) or neither is.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    fn authenticated(token: String, user: User) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}

/// What `initialize_auth` found in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Nothing persisted; the session was left untouched
    NoStoredToken,
    /// A valid token was adopted
    Restored(User),
    /// The stored token was malformed or expired and has been cleared
    Discarded(TokenError),
}

/// Single source of truth for "is the caller authenticated".
///
/// Shared as `Arc<SessionStore>`; `set_token`, `logout` and `initialize_auth`
/// are the only mutators. Transitions are serialized, so concurrent callers
/// converge on the same state. Decode and expiry failures never surface as
/// errors: they force a logout and callers observe the resulting state.
pub struct SessionStore {
    state: watch::Sender<Session>,
    transitions: Mutex<()>,
    storage: Arc<dyn TokenStorage>,
    cookie: CookieAttributes,
    clock: Arc<dyn Clock>,
}

impl Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .field("storage", &self.storage)
            .field("cookie", &self.cookie)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>, cookie: CookieAttributes) -> Self {
        Self::with_clock(storage, cookie, Arc::new(SystemClock))
    }

    pub fn with_clock(
        storage: Arc<dyn TokenStorage>,
        cookie: CookieAttributes,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state,
            transitions: Mutex::new(()),
            storage,
            cookie,
            clock,
        }
    }

    /// Adopt a freshly issued token.
    ///
    /// Surrounding whitespace is dropped before the token is held or
    /// persisted. A token that cannot be decoded, or that is already expired,
    /// logs the session out instead. Check [`Self::is_authenticated`]
    /// afterwards.
    pub fn set_token(&self, token: &str) {
        let _transition = self.begin_transition();
        let token = token.trim();

        match self.validate(token) {
            Ok(claims) => {
                let user = User::from(&claims);
                info!("Session established for user {}", user.id);
                self.publish(Session::authenticated(token.to_string(), user));
                self.persist(token);
            }
            Err(e) => {
                warn!("Rejecting token: {}", e);
                self.clear();
            }
        }
    }

    /// Drop the persisted token and reset the session. Idempotent.
    pub fn logout(&self) {
        let _transition = self.begin_transition();
        self.clear();
    }

    /// Rehydrate the session from storage at startup.
    ///
    /// Safe to call repeatedly; the stored token is not re-persisted.
    pub fn initialize_auth(&self) -> InitOutcome {
        let _transition = self.begin_transition();

        let stored = match self.storage.get_item(AUTH_COOKIE_NAME) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read persisted token, starting unauthenticated: {}", e);
                None
            }
        };

        let Some(stored) = stored else {
            debug!("No persisted token found");
            return InitOutcome::NoStoredToken;
        };

        let token = stored.value.trim();
        match self.validate(token) {
            Ok(claims) => {
                let user = User::from(&claims);
                info!("Session restored for user {}", user.id);
                self.publish(Session::authenticated(token.to_string(), user.clone()));
                InitOutcome::Restored(user)
            }
            Err(e) => {
                warn!("Discarding persisted token: {}", e);
                self.clear();
                InitOutcome::Discarded(e)
            }
        }
    }

    /// Re-check the held token against the clock, logging out once it has lapsed.
    pub fn ensure_valid(&self) -> bool {
        let _transition = self.begin_transition();

        let Some(token) = self.state.borrow().token.clone() else {
            return false;
        };

        match self.validate(&token) {
            Ok(_) => true,
            Err(e) => {
                info!("Session ended: {}", e);
                self.clear();
                false
            }
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Seconds left on the held token, if any
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        let token = self.token()?;
        let claims = token_introspection::decode_claims(&token).ok()?;
        token_introspection::seconds_until_expiry(&claims, self.clock.now())
    }

    /// Whether the held token lapses within `threshold_secs`; true when no
    /// usable token is held.
    pub fn is_expiring_within(&self, threshold_secs: i64) -> bool {
        self.token()
            .and_then(|token| token_introspection::decode_claims(&token).ok())
            .is_none_or(|claims| {
                token_introspection::is_expiring_within(&claims, self.clock.now(), threshold_secs)
            })
    }

    /// Receive every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub const fn cookie_attributes(&self) -> CookieAttributes {
        self.cookie
    }

    fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = token_introspection::decode_claims(token)?;
        token_introspection::check_expiry(&claims, self.clock.now())?;
        Ok(claims)
    }

    fn persist(&self, token: &str) {
        let stored = StoredToken {
            value: token.to_string(),
            expires_at: self.clock.now() + self.cookie.retention_days * SECONDS_PER_DAY,
            same_site: self.cookie.same_site,
            secure: self.cookie.secure,
        };

        if let Err(e) = self.storage.set_item(AUTH_COOKIE_NAME, &stored) {
            warn!("Failed to persist token: {}. Session only held in memory.", e);
        }
    }

    fn clear(&self) {
        if let Err(e) = self.storage.remove_item(AUTH_COOKIE_NAME) {
            warn!("Failed to remove persisted token: {}. Session only cleared from memory.", e);
        }
        if self.state.borrow().is_authenticated() {
            info!("Session cleared");
        }
        self.publish(Session::default());
    }

    fn publish(&self, next: Session) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn begin_transition(&self) -> MutexGuard<'_, ()> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
