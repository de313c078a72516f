//! Client-side token decoding.
//!
//! Tokens are decoded WITHOUT verifying their signature. The issuing backend
//! is trusted by construction and re-verifies every token it receives; a
//! successful decode here only yields claims to drive presentation (who is
//! shown as signed in, when the session lapses). It is never proof that the
//! token is authentic, and nothing in this crate may grant access based on it.

use super::claims::Claims;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token expired at {exp} (now {now})")]
    Expired { exp: i64, now: i64 },
}

/// Decode the claims of a JWT-shaped token (`header.payload.signature`).
///
/// Surrounding whitespace is ignored. The token travels as a cookie value,
/// so any other character outside visible ASCII (or a `;`) makes it
/// malformed.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let token = token.trim();
    if let Some(bad) = token.chars().find(|c| !is_cookie_safe(*c)) {
        return Err(TokenError::Malformed(format!(
            "character {:?} cannot be sent in a cookie",
            bad
        )));
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    let payload = parts[1];
    if payload.is_empty() {
        return Err(TokenError::Malformed("empty payload segment".to_string()));
    }

    let decoded = base64_url_decode(payload)?;

    serde_json::from_slice::<Claims>(&decoded)
        .map_err(|e| TokenError::Malformed(format!("invalid claims payload: {}", e)))
}

/// A token is expired once `exp` is at or before `now`.
pub const fn check_expiry(claims: &Claims, now: i64) -> Result<(), TokenError> {
    if claims.exp <= now {
        Err(TokenError::Expired { exp: claims.exp, now })
    } else {
        Ok(())
    }
}

/// Seconds until expiry, or `None` if already expired
pub const fn seconds_until_expiry(claims: &Claims, now: i64) -> Option<i64> {
    let seconds = claims.exp.saturating_sub(now);
    if seconds <= 0 { None } else { Some(seconds) }
}

/// Check if the claims expire within the given threshold
pub const fn is_expiring_within(claims: &Claims, now: i64, threshold_secs: i64) -> bool {
    match seconds_until_expiry(claims, now) {
        Some(secs) => secs <= threshold_secs,
        None => true,
    }
}

const fn is_cookie_safe(c: char) -> bool {
    c.is_ascii_graphic() && c != ';'
}

/// Decode base64url (JWT uses base64url, padding optional)
fn base64_url_decode(input: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| TokenError::Malformed(format!("payload is not base64url: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::{Value, json};

    /// Build an unsigned token around an arbitrary JSON payload.
    pub fn token_with_payload(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.c2lnbmF0dXJl", header, body)
    }

    pub fn token_for(user_id: i64, email: &str, exp: i64) -> String {
        token_with_payload(&json!({ "user_id": user_id, "email": email, "exp": exp }))
    }

    pub fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}
