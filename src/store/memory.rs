use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, DatabaseError};
use crate::store::{CredentialStore, NewUser, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRecord>,
    // (email, token fingerprint)
    tokens: HashSet<(String, String)>,
}

/// Process-local credential store for tests and local development
///
/// All state sits behind a single mutex, so every operation is atomic with
/// respect to the others.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.lock()?.users.get(email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let mut tables = self.lock()?;
        if tables.users.contains_key(&user.email) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            )));
        }

        let record = UserRecord {
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn delete_user(&self, email: &str) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        let existed = tables.users.remove(email).is_some();
        tables.tokens.retain(|(owner, _)| owner != email);
        Ok(existed)
    }

    async fn is_token_valid(
        &self,
        email: &str,
        token_fingerprint: &str,
    ) -> Result<bool, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .tokens
            .contains(&(email.to_string(), token_fingerprint.to_string())))
    }

    async fn insert_token(&self, email: &str, token_fingerprint: &str) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(email) {
            return Err(AppError::Database(DatabaseError::UnexpectedError(
                "refresh token owner does not exist".to_string(),
            )));
        }
        // Token fingerprints are globally unique, regardless of owner
        if tables.tokens.iter().any(|(_, fp)| fp == token_fingerprint) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Refresh token already stored".to_string(),
            )));
        }

        tables
            .tokens
            .insert((email.to_string(), token_fingerprint.to_string()));
        Ok(())
    }

    async fn delete_token(&self, email: &str, token_fingerprint: &str) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        Ok(tables
            .tokens
            .remove(&(email.to_string(), token_fingerprint.to_string())))
    }
}
