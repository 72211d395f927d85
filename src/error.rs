/// Application Error Handling
///
/// One error type flows through the whole service:
/// 1. Domain-specific error enums (validation, database, config, auth)
/// 2. A central `AppError` used for control flow (`?` everywhere)
/// 3. HTTP response mapping with structured, leveled logging
/// 4. Request-scoped error context for log correlation

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::logger::current_request_id;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    SuspiciousContent(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// Credential store errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    InvariantViolation(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::InvariantViolation(msg) => {
                write!(f, "Storage invariant violated: {}", msg)
            }
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
///
/// `InvalidCredentials` deliberately covers wrong passwords, unknown
/// emails, and forged/expired/malformed tokens alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    Unauthenticated,
    MissingRefreshToken,
    SignupDisabled,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Unauthenticated => write!(f, "No authorization header received"),
            AuthError::MissingRefreshToken => write!(f, "No refresh cookie received"),
            AuthError::SignupDisabled => write!(f, "Signup is currently disabled"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl AppError {
    /// Returns the auth error kind, if this is one.
    pub fn auth_kind(&self) -> Option<AuthError> {
        match self {
            AppError::Auth(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::Database(unique_violation(db_err.constraint()));
            }
        }

        match &err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

/// Primary key of `users`, the only uniqueness a client can trip over
pub const USERS_EMAIL_CONSTRAINT: &str = "users_pkey";

fn unique_violation(constraint: Option<&str>) -> DatabaseError {
    let detail = match constraint {
        Some(USERS_EMAIL_CONSTRAINT) => "Email already registered".to_string(),
        Some(name) => format!("constraint {}", name),
        None => "unique constraint".to_string(),
    };
    DatabaseError::UniqueConstraintViolation(detail)
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
            ),

            AppError::Database(e) => match e {
                // Duplicate signup surfaces as 400, not 409
                DatabaseError::UniqueConstraintViolation(_) => (
                    StatusCode::BAD_REQUEST,
                    "DUPLICATE_ENTRY",
                    e.to_string(),
                ),
                DatabaseError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    e.to_string(),
                ),
                DatabaseError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service temporarily unavailable".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                ),
            },

            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    e.to_string(),
                ),
                AuthError::Unauthenticated => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    e.to_string(),
                ),
                AuthError::MissingRefreshToken => (
                    StatusCode::UNAUTHORIZED,
                    "MISSING_REFRESH_TOKEN",
                    e.to_string(),
                ),
                AuthError::SignupDisabled => (
                    StatusCode::FORBIDDEN,
                    "SIGNUP_DISABLED",
                    e.to_string(),
                ),
            },

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(request_id = request_id, error = %self, "Record not found");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id =
            current_request_id().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::BAD_REQUEST,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(AuthError::SignupDisabled) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Request-scoped context for correlating log lines of one operation
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub email: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: current_request_id()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            email: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Logs `error` with this context and hands it back for propagation.
    pub fn record(&self, error: AppError) -> AppError {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "email": self.email,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match &error {
            AppError::Validation(_) | AppError::Auth(_) => {
                tracing::warn!(error = %error, context = ?context, "Operation rejected");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_))
            | AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::warn!(error = %error, context = ?context, "Operation rejected");
            }
            _ => {
                tracing::error!(error = %error, context = ?context, "Operation failed");
            }
        }

        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_auth_errors_map_to_401_except_signup() {
        for kind in [
            AuthError::InvalidCredentials,
            AuthError::Unauthenticated,
            AuthError::MissingRefreshToken,
        ] {
            let err = AppError::Auth(kind);
            assert_eq!(ResponseError::status_code(&err), StatusCode::UNAUTHORIZED);
        }

        let disabled = AppError::Auth(AuthError::SignupDisabled);
        assert_eq!(ResponseError::status_code(&disabled), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_duplicate_email_is_bad_request() {
        let err = AppError::Database(DatabaseError::UniqueConstraintViolation("x".into()));
        let (status, body) = ErrorHandler::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "DUPLICATE_ENTRY");
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        let (_, body) = ErrorHandler::error_response(&err, "req-2");

        assert_eq!(body.message, "Invalid credentials");
        assert_eq!(body.code, "INVALID_CREDENTIALS");
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Internal("lock poisoned in credential store".to_string());
        let (status, body) = ErrorHandler::error_response(&err, "req-3");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_auth_kind() {
        let err: AppError = AuthError::MissingRefreshToken.into();
        assert_eq!(err.auth_kind(), Some(AuthError::MissingRefreshToken));

        let err: AppError = ValidationError::InvalidFormat("email".into()).into();
        assert_eq!(err.auth_kind(), None);
    }

    #[test]
    fn test_unique_violation_names_email_only_for_users() {
        let email = unique_violation(Some(USERS_EMAIL_CONSTRAINT));
        assert_eq!(email.to_string(), "Duplicate entry: Email already registered");

        let token = unique_violation(Some("refresh_tokens_token_hash_key"));
        assert!(!token.to_string().contains("Email"));

        let (status, body) =
            ErrorHandler::error_response(&AppError::Database(token), "req-4");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.message.contains("Email"));
    }

    #[tokio::test]
    async fn test_error_body_and_context_share_request_id() {
        let (context, response) = crate::logger::with_request_id("req-5".to_string(), async {
            let context = ErrorContext::new("user_login");
            let response =
                ResponseError::error_response(&AppError::Auth(AuthError::InvalidCredentials));
            (context, response)
        })
        .await;

        assert_eq!(context.request_id, "req-5");

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error_id"], "req-5");
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("user_login");
        assert_eq!(ctx.operation, "user_login");
        assert!(ctx.email.is_none());

        let ctx = ctx.with_email("a@x.com");
        assert_eq!(ctx.email.as_deref(), Some("a@x.com"));
    }
}
