use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use url::Url;

use crate::api_clients::client_trait::CatalogApi;
use crate::api_clients::error_handling::map_backend_error;
use crate::api_clients::query_cache::QueryCache;
use crate::auth::{Session, SessionStore};
use crate::config::RuntimeConfig;
use crate::constants::{API_PREFIX, CATEGORY_LIST_PATH, FRUIT_LIST_PATH};
use crate::error::{AppError, AppResult};
use crate::models::{Category, Fruit};
use crate::utils::{RetryConfig, canonical_path, join_route, retry_with_backoff};

/// Fetches the fruit and category catalog through the `/api` rewrite.
pub struct CatalogClient {
    http_client: Client,
    config: Arc<RuntimeConfig>,
    session: Arc<SessionStore>,
    cache: QueryCache,
    retry: RetryConfig,
    session_changes: Mutex<watch::Receiver<Session>>,
}

impl CatalogClient {
    pub fn new(http_client: Client, config: Arc<RuntimeConfig>, session: Arc<SessionStore>) -> Self {
        let session_changes = Mutex::new(session.subscribe());
        Self {
            http_client,
            config,
            session,
            cache: QueryCache::default(),
            retry: RetryConfig::single_retry(),
            session_changes,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    // Cached responses belong to the session that fetched them
    fn sync_with_session(&self) {
        let mut changes = self
            .session_changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if changes.has_changed().unwrap_or(false) {
            changes.mark_unchanged();
            debug!("Session changed, dropping cached queries");
            self.cache.invalidate_all();
        }
    }

    async fn query<T>(&self, path: &str, resource: &str) -> AppResult<T>
    where
        T: DeserializeOwned + Send,
    {
        self.session.ensure_valid();
        self.sync_with_session();

        let path = canonical_path(path).into_owned();
        let value = match self.cache.get_fresh(&path) {
            Some(value) => value,
            None => {
                let url = self.config.endpoint(&path)?;
                let fetched_for = self.session.snapshot();
                let value =
                    retry_with_backoff(|| self.fetch(url.clone(), resource), &self.retry, resource)
                        .await?;
                // A response fetched for an identity that has since changed is not cached
                if self.session.snapshot() == fetched_for {
                    self.cache.insert(&path, value.clone());
                } else {
                    debug!("Session changed while fetching {}, not caching", resource);
                }
                value
            }
        };

        serde_json::from_value(value).map_err(|e| {
            warn!("Unexpected {} payload: {}", resource, e);
            AppError::InvalidResponse(format!("Failed to parse {}: {}", resource, e))
        })
    }

    async fn fetch(&self, url: Url, resource: &str) -> AppResult<Value> {
        debug!("GET {}", url.path());
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_backend_error(status.as_u16(), &error_text, resource));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::InvalidResponse(format!("Failed to parse {}: {}", resource, e)))
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn get_all_fruits(&self) -> AppResult<Vec<Fruit>> {
        self.query(FRUIT_LIST_PATH, "fruit list").await
    }

    async fn get_fruit_by_id(&self, id: i64) -> AppResult<Fruit> {
        let path = join_route(&join_route(API_PREFIX, "fruit"), &id.to_string());
        self.query(&path, &format!("fruit {}", id)).await
    }

    async fn get_all_categories(&self) -> AppResult<Vec<Category>> {
        self.query(CATEGORY_LIST_PATH, "category list").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token_introspection::test_tokens::{now, token_for};
    use crate::auth::{CookieAttributes, MemoryTokenStorage, SessionCookieProvider};
    use crate::config::{Environment, StorageBackend};
    use crate::api_clients::http_client::build_http_client;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;

    fn client_for(server: &Server) -> (CatalogClient, Arc<SessionStore>) {
        let config = Arc::new(RuntimeConfig::new(
            Url::parse(&server.url()).unwrap(),
            Environment::Development,
            StorageBackend::Memory,
        ));
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryTokenStorage::new()),
            CookieAttributes::new(false),
        ));
        let provider = Arc::new(SessionCookieProvider::new(
            Arc::clone(&session),
            config.app_origin.clone(),
        ));
        let http = build_http_client(&config, provider).unwrap();
        let client = CatalogClient::new(http, config, Arc::clone(&session))
            .with_retry(RetryConfig::single_retry().with_base_delay(Duration::from_millis(1)));
        (client, session)
    }

    #[tokio::test]
    async fn test_get_all_fruits() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/fruit/all")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{ "id": 1, "name": "Apple" }, { "id": 2, "name": "Banana" }]).to_string())
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let fruits = client.get_all_fruits().await.unwrap();

        assert_eq!(fruits.len(), 2);
        assert_eq!(fruits[1].name, "Banana");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fruit_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/fruit/99")
            .with_status(404)
            .with_body(r#"{"message":"Buah tidak ditemukan"}"#)
            .expect(1)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.get_fruit_by_id(99).await.unwrap_err();

        assert!(matches!(err, AppError::NotFoundError(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/kategori")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.get_all_categories().await.unwrap_err();

        assert!(matches!(err, AppError::ExternalServiceError(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_queries_are_cached_until_session_changes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/kategori")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{ "id": 1, "nama": "Tropis" }]).to_string())
            .expect(2)
            .create_async()
            .await;

        let (client, session) = client_for(&server);
        client.get_all_categories().await.unwrap();
        client.get_all_categories().await.unwrap();

        session.set_token(&token_for(1, "a@b.com", now() + 3600));
        let categories = client.get_all_categories().await.unwrap();

        assert_eq!(categories[0].name, "Tropis");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_response_is_not_cached_across_a_session_change() {
        let mut server = Server::new_async().await;
        let categories = server
            .mock("GET", "/api/kategori")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(300));
                w.write_all(br#"[{"id":1,"nama":"user1-private"}]"#)
            })
            .expect(2)
            .create_async()
            .await;
        let _fruits = server
            .mock("GET", "/api/fruit/all")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let (client, session) = client_for(&server);
        session.set_token(&token_for(1, "user1@b.com", now() + 3600));

        let (in_flight, ()) = tokio::join!(client.get_all_categories(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.logout();
            client.get_all_fruits().await.unwrap();
        });
        in_flight.unwrap();

        // Served by the backend again rather than from user1's cached response
        client.get_all_categories().await.unwrap();
        categories.assert_async().await;
    }

    #[tokio::test]
    async fn test_session_cookie_is_sent() {
        let mut server = Server::new_async().await;
        let token = token_for(5, "a@b.com", now() + 3600);
        let mock = server
            .mock("GET", "/api/fruit/5")
            .match_header("cookie", Matcher::Exact(format!("auth_token={}", token)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": 5, "name": "Mango", "family": "Anacardiaceae" }).to_string())
            .create_async()
            .await;

        let (client, session) = client_for(&server);
        session.set_token(&token);
        let fruit = client.get_fruit_by_id(5).await.unwrap();

        assert_eq!(fruit.family.as_deref(), Some("Anacardiaceae"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unexpected_payload_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/fruit/all")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"fruits":"none"}"#)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        assert!(matches!(
            client.get_all_fruits().await,
            Err(AppError::InvalidResponse(_))
        ));
    }
}
