//! Session and data-fetching core of the mentor chat client.
//!
//! The [`auth::SessionStore`] owns the authentication token: it decodes the
//! token's claims (without verifying the signature, which stays the
//! backend's job), persists it for seven days and rehydrates it on start.
//! The clients in [`api_clients`] send credentialed requests to the `/auth`
//! and `/api` backends through the hosting origin.

pub mod api_clients;
pub mod app_context;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod utils;

pub use app_context::AppContext;
pub use auth::{InitOutcome, Session, SessionStore, User};
pub use config::RuntimeConfig;
pub use error::{AppError, AppResult};
