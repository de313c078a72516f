use log::info;
use std::sync::Arc;

use crate::api_clients::{AuthClient, CatalogClient, build_http_client};
use crate::auth::{InitOutcome, SessionCookieProvider, SessionStore, session_store_for};
use crate::config::RuntimeConfig;
use crate::error::AppResult;

/// Everything a front end needs, wired around one shared [`SessionStore`].
///
/// Pass this (or the pieces it exposes) to the components that need session
/// state instead of reaching for a global.
pub struct AppContext {
    pub config: Arc<RuntimeConfig>,
    pub session: Arc<SessionStore>,
    pub auth: AuthClient,
    pub catalog: CatalogClient,
}

impl AppContext {
    pub fn new(config: RuntimeConfig) -> AppResult<Self> {
        let session = session_store_for(&config);
        Self::with_session(config, session)
    }

    pub fn with_session(config: RuntimeConfig, session: Arc<SessionStore>) -> AppResult<Self> {
        let config = Arc::new(config);
        let cookie_provider = Arc::new(SessionCookieProvider::new(
            Arc::clone(&session),
            config.app_origin.clone(),
        ));
        let http_client = build_http_client(&config, cookie_provider)?;

        let auth = AuthClient::new(http_client.clone(), Arc::clone(&config), Arc::clone(&session));
        let catalog = CatalogClient::new(http_client, Arc::clone(&config), Arc::clone(&session));

        Ok(Self {
            config,
            session,
            auth,
            catalog,
        })
    }

    /// Rehydrate the session; call once at startup (repeat calls are harmless).
    pub fn initialize(&self) -> InitOutcome {
        let outcome = self.session.initialize_auth();
        info!("Session initialization: {:?}", outcome);
        outcome
    }
}
