/// Refresh Token Handling
///
/// Refresh tokens are signed JWTs handed to the client in the `refresh`
/// cookie. The credential store keeps only a SHA-256 fingerprint of each
/// issued token; a row's presence proves the token was issued and has not
/// yet been rotated or revoked.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use sha2::{Digest, Sha256};

use crate::auth::jwt::IssuedToken;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refresh";

/// Fingerprint a refresh token for storage
///
/// Never store plaintext tokens in the database.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cookie carrying a freshly issued refresh token, expiring with it
pub fn refresh_cookie(issued: &IssuedToken) -> Cookie<'static> {
    let remaining = (issued.expires_at() - chrono::Utc::now().timestamp()).max(0);

    Cookie::build(REFRESH_COOKIE_NAME, issued.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(remaining))
        .finish()
}

/// Cookie that clears the refresh token on the client
pub fn cleared_refresh_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE_NAME, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
