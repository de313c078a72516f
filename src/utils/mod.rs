pub mod env_utils;
pub mod path_utils;
pub mod retry;

pub use env_utils::*;
pub use path_utils::*;
pub use retry::*;
