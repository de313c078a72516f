use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serde JSON error: {0}")]
    SerdeError(String),

    #[error("HTTP client error: {0}")]
    HttpError(String),

    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    /// Whether a failed request is worth sending again.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_) | Self::HttpError(_) | Self::ExternalServiceError(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::NetworkError(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<keyring::Error> for AppError {
    fn from(err: keyring::Error) -> Self {
        Self::KeyringError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("Invalid URL: {}", err))
    }
}

// Machine-readable form used by the CLI's `--json` output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<AppError> for SerializableError {
    fn from(error: AppError) -> Self {
        let code = match error {
            AppError::IoError(_) => "IO_ERROR",
            AppError::SerdeError(_) => "SERDE_ERROR",
            AppError::HttpError(_) => "HTTP_ERROR",
            AppError::KeyringError(_) => "KEYRING_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFoundError(_) => "NOT_FOUND_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::AccessDenied(_) => "ACCESS_DENIED_ERROR",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT_ERROR",
            AppError::NetworkError(_) => "NETWORK_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::InvalidResponse(_) => "INVALID_RESPONSE_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
        }
        .to_string();

        SerializableError {
            code,
            message: error.to_string(),
            details: None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializable_error_code() {
        let err: SerializableError = AppError::AuthError("Login failed".to_string()).into();
        assert_eq!(err.code, "AUTH_ERROR");
        assert_eq!(err.message, "Authentication error: Login failed");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::NetworkError("reset".into()).is_transient());
        assert!(AppError::ExternalServiceError("502".into()).is_transient());
        assert!(!AppError::AuthError("401".into()).is_transient());
        assert!(!AppError::NotFoundError("fruit".into()).is_transient());
    }
}
