/// Authentication Routes
///
/// Login, silent refresh, and logout. The access token travels in the JSON
/// body and must be sent back as a bearer credential; the refresh token only
/// ever travels in the `refresh` cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{cleared_refresh_cookie, refresh_cookie, AuthService, Session, REFRESH_COOKIE_NAME};
use crate::error::{AppError, ErrorContext};
use crate::store::User;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by login and refresh
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

fn session_response(session: Session, expires_in: i64) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(refresh_cookie(&session.refresh_token))
        .json(LoginResponse {
            access_token: session.access_token.token,
            token_type: "Bearer".to_string(),
            expires_in,
            user: session.user,
        })
}

fn refresh_cookie_value(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// POST /login
///
/// # Errors
/// - 401: Invalid credentials (unknown email and wrong password are indistinguishable)
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let session = auth
        .login(&form.email, &form.password)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        email = %session.user.email,
        "Login succeeded"
    );

    Ok(session_response(session, auth.access_token_ttl()))
}

/// POST /refresh
///
/// Rotates the `refresh` cookie: the presented token stops working as soon
/// as this call succeeds.
///
/// # Errors
/// - 401: Missing cookie, or an invalid, expired, rotated or revoked token
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let cookie = refresh_cookie_value(&req);

    let session = auth
        .refresh_session(cookie.as_deref())
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        email = %session.user.email,
        "Token refreshed"
    );

    Ok(session_response(session, auth.access_token_ttl()))
}

/// POST /logout
///
/// **Requires a valid access token.** Revokes the refresh token in the
/// cookie and clears the cookie.
///
/// # Errors
/// - 401: Not authenticated (guard) or no refresh cookie
pub async fn logout(
    req: HttpRequest,
    user: web::ReqData<User>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = user.into_inner();
    let context = ErrorContext::new("user_logout").with_email(user.email.clone());
    let cookie = refresh_cookie_value(&req);

    auth.logout(cookie.as_deref(), &user)
        .await
        .map_err(|e| context.record(e))?;

    Ok(HttpResponse::Ok().cookie(cleared_refresh_cookie()).finish())
}
