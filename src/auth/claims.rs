/// Token Claims
///
/// The signed payload carried by both access and refresh tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim set shared by access and refresh tokens
///
/// `email` and `exp` are the only claims required on verification; a token
/// missing either fails to decode.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identity of the token holder
    pub email: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp, seconds)
    #[serde(default)]
    pub iat: i64,
    /// Token id, unique per issued token
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Claims expiring `ttl_seconds` from now
    pub fn new(email: impl Into<String>, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self::build(email.into(), now, now + ttl_seconds)
    }

    /// Claims with an explicit expiry timestamp
    pub fn expiring_at(email: impl Into<String>, exp: i64) -> Self {
        Self::build(email.into(), Utc::now().timestamp(), exp)
    }

    fn build(email: String, iat: i64, exp: i64) -> Self {
        Self {
            email,
            exp,
            iat,
            jti: Uuid::new_v4().to_string(),
        }
    }
}
