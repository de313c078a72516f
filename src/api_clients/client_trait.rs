use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Category, Fruit};

/// Read-only catalog served under `/api`.
///
/// Requests are credentialed; whether the backend requires a session is its
/// own decision.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_all_fruits(&self) -> AppResult<Vec<Fruit>>;

    async fn get_fruit_by_id(&self, id: i64) -> AppResult<Fruit>;

    async fn get_all_categories(&self) -> AppResult<Vec<Category>>;
}
