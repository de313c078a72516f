use std::time::Duration;

// Default origin of the hosting layer; /api and /auth are rewritten behind it
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:3000";

// Persisted token entry
pub const AUTH_COOKIE_NAME: &str = "auth_token";
pub const TOKEN_RETENTION_DAYS: i64 = 7;
// Status output flags a session that lapses within this window
pub const EXPIRY_WARNING_SECS: i64 = 5 * 60;

// Keyring identity for the keyring storage backend
pub const SERVICE_NAME_FOR_KEYRING: &str = "mentor-session";

// File name of the cookie jar used by the file storage backend
pub const COOKIE_JAR_FILE_NAME: &str = "cookies.json";
pub const APP_DATA_DIR_NAME: &str = "mentor-session";

// Route prefix resolved by the hosting layer
pub const API_PREFIX: &str = "/api";

pub const LOGIN_PATH: &str = "/auth/login";
pub const FRUIT_LIST_PATH: &str = "/api/fruit/all";
pub const CATEGORY_LIST_PATH: &str = "/api/kategori";

// Query behaviour
pub const QUERY_STALE_TIME: Duration = Duration::from_secs(60);
pub const REQUEST_RETRIES: u32 = 1;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
