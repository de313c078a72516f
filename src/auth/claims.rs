use serde::{Deserialize, Serialize};

/// Claims carried in the payload of a token issued by the auth backend.
///
/// Every field is required: a payload without `exp` (or without an identity)
/// does not deserialize and the token is treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

/// Identity retained for display, projected from [`Claims`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

impl From<&Claims> for User {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email.clone(),
        }
    }
}
