use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};
use crate::store::{CredentialStore, NewUser, UserRecord};

/// Postgres-backed credential store
///
/// Schema lives in `migrations/`. `refresh_tokens.email` references
/// `users.email` with `ON DELETE CASCADE`.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "SELECT email, name, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email, name, password_hash, created_at)| UserRecord {
            email,
            name,
            password_hash,
            created_at,
        }))
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO users (email, name, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(UserRecord {
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at,
        })
    }

    async fn delete_user(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_token_valid(
        &self,
        email: &str,
        token_fingerprint: &str,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM refresh_tokens WHERE email = $1 AND token_hash = $2",
        )
        .bind(email)
        .bind(token_fingerprint)
        .fetch_one(&self.pool)
        .await?;

        match count {
            0 => Ok(false),
            1 => Ok(true),
            n => {
                tracing::error!(rows = n, "Multiple refresh token rows share one fingerprint");
                Err(AppError::Database(DatabaseError::InvariantViolation(
                    "duplicate refresh token rows".to_string(),
                )))
            }
        }
    }

    async fn insert_token(&self, email: &str, token_fingerprint: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (email, token_hash, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(email)
        .bind(token_fingerprint)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_token(&self, email: &str, token_fingerprint: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE email = $1 AND token_hash = $2")
                .bind(email)
                .bind(token_fingerprint)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
