//! Credential Store
//!
//! Persists user accounts and the refresh-token rows that prove a token was
//! issued and not yet rotated or revoked. Users and tokens are related only by
//! email. Deleting a user removes that user's tokens.
//!
//! Deleting a token row is the serialization point for refresh rotation:
//! `delete_token` reports whether it removed anything, and of two concurrent
//! deletes of the same row only one may observe `true`.

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

/// Public user profile
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Stored user row, including the password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn profile(&self) -> User {
        User {
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Data needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Fails with `DatabaseError::UniqueConstraintViolation` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, AppError>;

    /// Removes the user and every refresh token they own. Returns whether a user existed.
    async fn delete_user(&self, email: &str) -> Result<bool, AppError>;

    /// Whether exactly one row exists for `(email, token_fingerprint)`.
    ///
    /// More than one matching row is an invariant violation and is reported
    /// as an error, never as a valid token.
    async fn is_token_valid(&self, email: &str, token_fingerprint: &str)
        -> Result<bool, AppError>;

    async fn insert_token(&self, email: &str, token_fingerprint: &str) -> Result<(), AppError>;

    /// Returns whether a row was removed. Removing nothing is not an error.
    async fn delete_token(&self, email: &str, token_fingerprint: &str) -> Result<bool, AppError>;
}
