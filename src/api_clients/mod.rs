pub mod auth_client;
pub mod catalog_client;
pub mod client_trait;
pub mod error_handling;
pub mod http_client;
pub mod query_cache;

pub use auth_client::AuthClient;
pub use catalog_client::CatalogClient;
pub use client_trait::CatalogApi;
pub use error_handling::map_backend_error;
pub use http_client::build_http_client;
pub use query_cache::QueryCache;
