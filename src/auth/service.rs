/// Authentication Protocol
///
/// Login, silent refresh with rotation, logout, and stateless request
/// authentication. All durable state lives in the credential store; the only
/// state held here is the pair of token codecs built from the signing keys.

use std::sync::Arc;

use crate::auth::jwt::{IssuedToken, TokenCodec};
use crate::auth::password::verify_password;
use crate::auth::refresh_token::fingerprint;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::store::{CredentialStore, User};

/// Outcome of a successful login or refresh
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
    pub user: User,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    access: TokenCodec,
    refresh: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, settings: &AuthSettings) -> Self {
        Self::with_codecs(
            store,
            TokenCodec::access(settings),
            TokenCodec::refresh(settings),
        )
    }

    pub fn with_codecs(
        store: Arc<dyn CredentialStore>,
        access: TokenCodec,
        refresh: TokenCodec,
    ) -> Self {
        Self {
            store,
            access,
            refresh,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn access_token_ttl(&self) -> i64 {
        self.access.ttl_seconds()
    }

    /// Verify credentials and open a new session.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = email.trim();

        let record = match self.store.get_user_by_email(email).await? {
            Some(record) => record,
            None => {
                tracing::info!("Login attempt for unknown account");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password, &record.password_hash) {
            tracing::info!(email = %record.email, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let session = self.open_session(record.profile()).await?;
        tracing::info!(email = %session.user.email, "User logged in");
        Ok(session)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is deleted before the new one is issued. If the
    /// delete removes nothing, another request already consumed the token
    /// and this one fails.
    pub async fn refresh_session(&self, refresh_cookie: Option<&str>) -> Result<Session, AppError> {
        let token = refresh_cookie
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self.refresh.verify(token).map_err(|rejection| {
            tracing::warn!(reason = %rejection, "Refresh token rejected");
            AuthError::InvalidCredentials
        })?;

        let token_fingerprint = fingerprint(token);

        if !self
            .store
            .is_token_valid(&claims.email, &token_fingerprint)
            .await?
        {
            tracing::warn!(email = %claims.email, "Stale or revoked refresh token presented");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !self
            .store
            .delete_token(&claims.email, &token_fingerprint)
            .await?
        {
            tracing::warn!(email = %claims.email, "Refresh token consumed by a concurrent request");
            return Err(AuthError::InvalidCredentials.into());
        }

        let record = self
            .store
            .get_user_by_email(&claims.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let session = self.open_session(record.profile()).await?;
        tracing::info!(email = %session.user.email, "Session refreshed");
        Ok(session)
    }

    /// Revoke the caller's refresh token. A token that is already gone is fine.
    pub async fn logout(&self, refresh_cookie: Option<&str>, user: &User) -> Result<(), AppError> {
        let token = refresh_cookie
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let removed = self
            .store
            .delete_token(&user.email, &fingerprint(token))
            .await?;

        tracing::info!(email = %user.email, revoked = removed, "User logged out");
        Ok(())
    }

    /// Resolve an `Authorization` header value to a user.
    ///
    /// Stateless apart from the user-existence check: no writes and no
    /// refresh-token lookups.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<User, AppError> {
        let header = authorization.ok_or(AuthError::Unauthenticated)?;

        let token = bearer_token(header);
        if token.is_empty() {
            return Err(AuthError::Unauthenticated.into());
        }

        let claims = self.access.verify(token).map_err(|rejection| {
            tracing::debug!(reason = %rejection, "Access token rejected");
            AuthError::InvalidCredentials
        })?;

        let record = self
            .store
            .get_user_by_email(&claims.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(record.profile())
    }

    async fn open_session(&self, user: User) -> Result<Session, AppError> {
        let access_token = self.access.issue(&user.email)?;
        let refresh_token = self.refresh.issue(&user.email)?;

        self.store
            .insert_token(&user.email, &fingerprint(&refresh_token.token))
            .await?;

        Ok(Session {
            access_token,
            refresh_token,
            user,
        })
    }
}

/// Strip an optional `Bearer ` scheme from a header value
fn bearer_token(header: &str) -> &str {
    let header = header.trim();
    if header == "Bearer" {
        return "";
    }
    header.strip_prefix("Bearer ").unwrap_or(header).trim()
}
