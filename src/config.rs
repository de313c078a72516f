use crate::constants::{
    APP_DATA_DIR_NAME, COOKIE_JAR_FILE_NAME, DEFAULT_APP_ORIGIN, DEFAULT_HTTP_TIMEOUT_SECS,
};
use crate::error::{AppError, AppResult};
use crate::utils::canonical_path;
use crate::utils::env_utils::{read_env, read_env_opt, read_env_u64};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Deployment environment; production requires a secure transport for the
/// persisted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AppError::ConfigError(format!("Unknown environment '{}'", other))),
        }
    }
}

/// Where the session token is persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process only; the token does not survive a restart
    Memory,
    /// JSON cookie jar on disk
    File(PathBuf),
    /// OS keyring
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Origin of the hosting layer that rewrites `/api/*` and `/auth/*`
    pub app_origin: Url,
    pub environment: Environment,
    pub storage: StorageBackend,
    pub http_timeout: Duration,
}

impl RuntimeConfig {
    pub fn new(app_origin: Url, environment: Environment, storage: StorageBackend) -> Self {
        Self {
            app_origin,
            environment,
            storage,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> AppResult<Self> {
        let origin = read_env("APP_ORIGIN", DEFAULT_APP_ORIGIN, true);
        let app_origin = Url::parse(&origin)?;

        let environment = read_env_opt("APP_ENV")
            .or_else(|| read_env_opt("NODE_ENV"))
            .map_or(Ok(Environment::Development), |v| v.parse())?;

        let storage = match read_env("SESSION_STORAGE", "file", true).to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "keyring" => StorageBackend::Keyring,
            "file" => StorageBackend::File(match read_env_opt("SESSION_STORAGE_PATH") {
                Some(path) => PathBuf::from(path),
                None => default_cookie_jar_path()?,
            }),
            other => {
                return Err(AppError::ConfigError(format!(
                    "Unknown SESSION_STORAGE backend '{}'",
                    other
                )));
            }
        };

        let http_timeout =
            Duration::from_secs(read_env_u64("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS, true));

        info!(
            "Runtime config loaded: origin={}, environment={:?}, storage={:?}",
            app_origin, environment, storage
        );

        Ok(Self {
            app_origin,
            environment,
            storage,
            http_timeout,
        })
    }

    /// The persisted token requires a secure channel everywhere except local development.
    pub const fn secure_cookies(&self) -> bool {
        !matches!(self.environment, Environment::Development)
    }

    /// Absolute URL for an application path such as `/api/fruit/all`.
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        let path = canonical_path(path);
        if !path.starts_with('/') {
            return Err(AppError::InvalidArgument(format!(
                "Application paths must be absolute, got '{}'",
                path
            )));
        }
        Ok(self.app_origin.join(&path)?)
    }
}

fn default_cookie_jar_path() -> AppResult<PathBuf> {
    let dir = dirs::data_local_dir()
        .ok_or_else(|| AppError::ConfigError("Failed to resolve local data dir".to_string()))?;
    Ok(dir.join(APP_DATA_DIR_NAME).join(COOKIE_JAR_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origin: &str, environment: Environment) -> RuntimeConfig {
        RuntimeConfig::new(
            Url::parse(origin).unwrap(),
            environment,
            StorageBackend::Memory,
        )
    }

    #[test]
    fn test_endpoint_joins_origin_and_lowercases() {
        let cfg = config("https://mentor.example.com", Environment::Production);
        assert_eq!(
            cfg.endpoint("/API/Fruit/All").unwrap().as_str(),
            "https://mentor.example.com/api/fruit/all"
        );
        assert_eq!(
            cfg.endpoint("/auth/login").unwrap().as_str(),
            "https://mentor.example.com/auth/login"
        );
    }

    #[test]
    fn test_endpoint_rejects_relative_paths() {
        let cfg = config("http://localhost:3000", Environment::Development);
        assert!(matches!(cfg.endpoint("api/kategori"), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_secure_cookies_outside_development() {
        assert!(!config("http://localhost:3000", Environment::Development).secure_cookies());
        assert!(config("https://a.example", Environment::Production).secure_cookies());
        assert!(config("https://a.example", Environment::Test).secure_cookies());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }
}
