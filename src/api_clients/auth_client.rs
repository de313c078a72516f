use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use url::Url;

use crate::api_clients::error_handling::map_backend_error;
use crate::auth::{SessionStore, User};
use crate::config::RuntimeConfig;
use crate::constants::LOGIN_PATH;
use crate::error::{AppError, AppResult};
use crate::models::{LoginRequest, LoginResponse};
use crate::utils::{RetryConfig, retry_with_backoff};

/// Login flow against the `/auth` backend.
///
/// A successful response hands its token to the session store; the caller
/// gets the resulting user or an authentication error.
pub struct AuthClient {
    http_client: Client,
    config: Arc<RuntimeConfig>,
    session: Arc<SessionStore>,
    retry: RetryConfig,
}

impl AuthClient {
    pub fn new(http_client: Client, config: Arc<RuntimeConfig>, session: Arc<SessionStore>) -> Self {
        Self {
            http_client,
            config,
            session,
            retry: RetryConfig::single_retry(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sign in and adopt the issued token.
    ///
    /// Only transient failures (network errors, 408, 429, 5xx) are retried,
    /// once. Any other non-2xx answer, rejected credentials included, fails
    /// immediately with `AuthError("Login failed")` instead of being retried.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let request = LoginRequest::new(email, password);
        let url = self.config.endpoint(LOGIN_PATH)?;
        info!("Login attempt for {}", email);

        let response = retry_with_backoff(
            || self.post_login(url.clone(), &request),
            &self.retry,
            "login",
        )
        .await?;

        self.session.set_token(&response.token);

        match self.session.user() {
            Some(user) => {
                info!("Login succeeded for user {}", user.id);
                Ok(user)
            }
            None => Err(AppError::AuthError(
                "Login succeeded but the issued token is unusable".to_string(),
            )),
        }
    }

    /// Local logout; the persisted token is removed and the session reset.
    pub fn logout(&self) {
        self.session.logout();
    }

    async fn post_login(&self, url: Url, request: &LoginRequest) -> AppResult<LoginResponse> {
        let response = self.http_client.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let mapped = map_backend_error(status.as_u16(), &error_text, "login");
            warn!("Login rejected with status {}: {}", status, mapped);
            return Err(if mapped.is_transient() {
                mapped
            } else {
                AppError::AuthError("Login failed".to_string())
            });
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| AppError::InvalidResponse(format!("Login response has no token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_clients::http_client::build_http_client;
    use crate::auth::token_introspection::test_tokens::{now, token_for};
    use crate::auth::{CookieAttributes, MemoryTokenStorage, SessionCookieProvider, TokenStorage};
    use crate::constants::AUTH_COOKIE_NAME;
    use crate::config::{Environment, StorageBackend};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &Server) -> (AuthClient, Arc<SessionStore>, Arc<MemoryTokenStorage>) {
        let config = Arc::new(RuntimeConfig::new(
            Url::parse(&server.url()).unwrap(),
            Environment::Development,
            StorageBackend::Memory,
        ));
        let storage = Arc::new(MemoryTokenStorage::new());
        let session = Arc::new(SessionStore::new(storage.clone(), CookieAttributes::new(false)));
        let provider = Arc::new(SessionCookieProvider::new(
            Arc::clone(&session),
            config.app_origin.clone(),
        ));
        let http = build_http_client(&config, provider).unwrap();
        let client = AuthClient::new(http, config, Arc::clone(&session))
            .with_retry(RetryConfig::single_retry().with_base_delay(Duration::from_millis(1)));
        (client, session, storage)
    }

    #[tokio::test]
    async fn test_login_adopts_token() {
        let mut server = Server::new_async().await;
        let token = token_for(42, "a@b.com", now() + 3600);
        let mock = server
            .mock("POST", "/auth/login")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "email": "a@b.com", "password": "secret" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "token": token }).to_string())
            .create_async()
            .await;

        let (client, session, storage) = client_for(&server);
        let user = client.login("a@b.com", "secret").await.unwrap();

        assert_eq!(user, User { id: 42, email: "a@b.com".to_string() });
        assert!(session.is_authenticated());
        assert_eq!(storage.get_item(AUTH_COOKIE_NAME).unwrap().unwrap().value, token);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message":"invalid credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let (client, session, _) = client_for(&server);
        let err = client.login("a@b.com", "wrong").await.unwrap_err();

        assert_eq!(err, AppError::AuthError("Login failed".to_string()));
        assert!(!session.is_authenticated());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_retries_once_on_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let (client, _, _) = client_for(&server);
        let err = client.login("a@b.com", "secret").await.unwrap_err();

        assert!(err.is_transient());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unusable_token_leaves_session_logged_out() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "token": "definitely-not-a-jwt" }).to_string())
            .create_async()
            .await;

        let (client, session, storage) = client_for(&server);
        let err = client.login("a@b.com", "secret").await.unwrap_err();

        assert!(matches!(err, AppError::AuthError(_)));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get_item(AUTH_COOKIE_NAME).unwrap(), None);
    }

    #[tokio::test]
    async fn test_response_without_token_is_invalid() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let (client, _, _) = client_for(&server);
        assert!(matches!(
            client.login("a@b.com", "secret").await,
            Err(AppError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let server = Server::new_async().await;
        let (client, session, storage) = client_for(&server);
        session.set_token(&token_for(1, "a@b.com", now() + 3600));

        client.logout();

        assert!(!session.is_authenticated());
        assert_eq!(storage.get_item(AUTH_COOKIE_NAME).unwrap(), None);
    }
}
