use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials posted to the login endpoint
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login body; only the token is required
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("message", &self.message)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_accepts_access_token_alias() {
        let body = json!({ "access_token": "t.o.k", "message": "ok" });
        let parsed: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.token, "t.o.k");
        assert_eq!(parsed.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let rendered = format!("{:?}", LoginRequest::new("a@b.com", "hunter2"));
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
