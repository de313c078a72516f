pub mod auth;
pub mod catalog;

pub use auth::*;
pub use catalog::*;
