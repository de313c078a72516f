use reqwest::Client;
use std::sync::Arc;

use crate::auth::SessionCookieProvider;
use crate::config::RuntimeConfig;
use crate::constants::HTTP_CONNECT_TIMEOUT;
use crate::error::{AppError, AppResult};

/// Build the shared HTTP client.
///
/// Requests are credentialed: the session cookie is attached by the cookie
/// provider rather than by each call site.
pub fn build_http_client(
    config: &RuntimeConfig,
    cookie_provider: Arc<SessionCookieProvider>,
) -> AppResult<Client> {
    Client::builder()
        .timeout(config.http_timeout)
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .cookie_provider(cookie_provider)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::HttpError(format!("Failed to build HTTP client: {}", e)))
}
