/// User Routes
///
/// Account creation (behind the signup toggle), profile lookup, and account
/// deletion.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{cleared_refresh_cookie, hash_password, validate_password_strength, AuthService};
use crate::configuration::ApplicationSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::store::{NewUser, User};
use crate::validators::{is_valid_email, is_valid_name};

/// User registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// POST /user
///
/// # Errors
/// - 403: Signup is disabled
/// - 400: Invalid input, or email already registered
pub async fn create_user(
    form: web::Json<CreateUserRequest>,
    auth: web::Data<AuthService>,
    application: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    if application.disable_signup {
        return Err(context.record(AuthError::SignupDisabled.into()));
    }

    let email = is_valid_email(&form.email).map_err(|e| context.record(e.into()))?;
    let name = is_valid_name(&form.name).map_err(|e| context.record(e.into()))?;
    validate_password_strength(&form.password).map_err(|e| context.record(e))?;
    let password_hash = hash_password(&form.password)?;

    let context = context.with_email(email.clone());
    let record = auth
        .store()
        .insert_user(NewUser {
            email,
            name,
            password_hash,
        })
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        email = %record.email,
        "User registered"
    );

    Ok(HttpResponse::Created().json(record.profile()))
}

/// GET /user/{email}
///
/// **Requires a valid access token.**
///
/// # Errors
/// - 401: Not authenticated
/// - 404: No such user
pub async fn get_user(
    path: web::Path<String>,
    _caller: web::ReqData<User>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = path.into_inner();

    let record = auth
        .store()
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("user".to_string())))?;

    Ok(HttpResponse::Ok().json(record.profile()))
}

/// DELETE /user
///
/// **Requires a valid access token.** Deletes the caller's account together
/// with every refresh token it owns, and clears the refresh cookie.
pub async fn delete_current_user(
    caller: web::ReqData<User>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let caller = caller.into_inner();
    let context = ErrorContext::new("user_deletion").with_email(caller.email.clone());

    auth.store()
        .delete_user(&caller.email)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, email = %caller.email, "User deleted");

    Ok(HttpResponse::Ok().cookie(cleared_refresh_cookie()).finish())
}
