/// Token Codec
///
/// Signs and verifies HS256 JWTs. One codec exists per signing key: access
/// tokens and refresh tokens never share a key, so a token minted by one
/// codec is always rejected by the other.

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::AppError;

/// Access tokens live for 15 minutes
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
/// Refresh tokens (and the refresh cookie) live for 14 days
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Why a token failed verification. Only ever logged; callers collapse
/// every variant into the same credential error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    BadSignature,
    MissingClaim,
    Malformed,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRejection::Expired => write!(f, "token expired"),
            TokenRejection::BadSignature => write!(f, "signature mismatch"),
            TokenRejection::MissingClaim => write!(f, "required claim missing"),
            TokenRejection::Malformed => write!(f, "malformed token"),
        }
    }
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    /// Codec for short-lived bearer tokens
    pub fn access(settings: &AuthSettings) -> Self {
        Self::new(&settings.access_token_key, ACCESS_TOKEN_TTL_SECONDS)
    }

    /// Codec for long-lived refresh tokens
    pub fn refresh(settings: &AuthSettings) -> Self {
        Self::new(&settings.refresh_token_key, REFRESH_TOKEN_TTL_SECONDS)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a new token for `email` using this codec's lifetime
    pub fn issue(&self, email: &str) -> Result<IssuedToken, AppError> {
        self.issue_claims(Claims::new(email, self.ttl_seconds))
    }

    /// Sign an arbitrary claim set
    pub fn issue_claims(&self, claims: Claims) -> Result<IssuedToken, AppError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Check signature, expiry and required claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejection> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                ErrorKind::MissingRequiredClaim(_) => TokenRejection::MissingClaim,
                // serde failure on the payload, e.g. no `email`
                ErrorKind::Json(_) => TokenRejection::MissingClaim,
                _ => TokenRejection::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const ACCESS_SECRET: &str = "test-access-secret-at-least-32-characters";
    const REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-characters";

    fn settings() -> AuthSettings {
        AuthSettings {
            access_token_key: ACCESS_SECRET.to_string(),
            refresh_token_key: REFRESH_SECRET.to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = TokenCodec::access(&settings());
        let issued = codec.issue("test@example.com").expect("Failed to issue token");

        let claims = codec.verify(&issued.token).expect("Failed to verify token");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.exp, issued.expires_at());
    }

    #[test]
    fn test_lifetimes() {
        let access = TokenCodec::access(&settings());
        let refresh = TokenCodec::refresh(&settings());

        assert_eq!(access.ttl_seconds(), 900);
        assert_eq!(refresh.ttl_seconds(), 1_209_600);

        let issued = refresh.issue("test@example.com").unwrap();
        let remaining = issued.expires_at() - Utc::now().timestamp();
        assert!(remaining > REFRESH_TOKEN_TTL_SECONDS - 5);
    }

    #[test]
    fn test_same_input_yields_distinct_tokens() {
        let codec = TokenCodec::access(&settings());
        let a = codec.issue("test@example.com").unwrap();
        let b = codec.issue("test@example.com").unwrap();

        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_access_token_rejected_by_refresh_codec() {
        let access = TokenCodec::access(&settings());
        let refresh = TokenCodec::refresh(&settings());

        let access_token = access.issue("test@example.com").unwrap();
        let refresh_token = refresh.issue("test@example.com").unwrap();

        assert_eq!(
            refresh.verify(&access_token.token),
            Err(TokenRejection::BadSignature)
        );
        assert_eq!(
            access.verify(&refresh_token.token),
            Err(TokenRejection::BadSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::access(&settings());
        let claims = Claims::expiring_at("test@example.com", Utc::now().timestamp() - 5);
        let issued = codec.issue_claims(claims).unwrap();

        assert_eq!(codec.verify(&issued.token), Err(TokenRejection::Expired));
    }

    #[test]
    fn test_missing_email_rejected() {
        let codec = TokenCodec::access(&settings());
        let payload = serde_json::json!({ "exp": Utc::now().timestamp() + 600 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenRejection::MissingClaim));
    }

    #[test]
    fn test_missing_expiry_rejected() {
        let codec = TokenCodec::access(&settings());
        let payload = serde_json::json!({ "email": "test@example.com" });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(codec.verify(&token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = TokenCodec::access(&settings());

        assert!(codec.verify("invalid.token.here").is_err());
        assert!(codec.verify("").is_err());
        assert!(codec.verify("garbage").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = TokenCodec::access(&settings());
        let issued = codec.issue("test@example.com").unwrap();

        let tampered = format!("{}X", issued.token);
        assert!(codec.verify(&tampered).is_err());
    }
}
