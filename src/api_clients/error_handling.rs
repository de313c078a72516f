use log::debug;
use serde::Deserialize;

use crate::error::AppError;

/// Error body returned by the backends
#[derive(Debug, Deserialize)]
struct BackendErrorResponse {
    #[serde(alias = "error")]
    message: String,
}

/// Map a non-2xx backend response to an AppError.
///
/// 408, 429 and 5xx map to `ExternalServiceError`, the only statuses worth
/// retrying.
pub fn map_backend_error(status_code: u16, response_text: &str, resource: &str) -> AppError {
    debug!("Mapping backend error: status={}, resource={}", status_code, resource);

    let detail = serde_json::from_str::<BackendErrorResponse>(response_text)
        .map(|body| body.message)
        .unwrap_or_else(|_| response_text.trim().to_string());
    let detail = if detail.is_empty() {
        format!("HTTP {}", status_code)
    } else {
        detail
    };

    match status_code {
        400 | 422 => AppError::ValidationError(format!("Bad request for {}: {}", resource, detail)),
        401 => AppError::AuthError(format!("Authentication failed for {}: {}", resource, detail)),
        403 => AppError::AccessDenied(format!("Access denied to {}: {}", resource, detail)),
        404 => AppError::NotFoundError(format!("{} not found: {}", resource, detail)),
        408 | 429 | 500..=599 => AppError::ExternalServiceError(format!(
            "Backend error ({}) for {}: {}",
            status_code, resource, detail
        )),
        _ => AppError::InvalidResponse(format!(
            "Unexpected status {} for {}: {}",
            status_code, resource, detail
        )),
    }
}
