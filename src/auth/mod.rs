/// Authentication module
///
/// Token signing/verification, password hashing, refresh-token cookies,
/// and the login / refresh / logout / authenticate protocol.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::Claims;
pub use jwt::{
    IssuedToken, TokenCodec, TokenRejection, ACCESS_TOKEN_TTL_SECONDS, REFRESH_TOKEN_TTL_SECONDS,
};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use refresh_token::{cleared_refresh_cookie, fingerprint, refresh_cookie, REFRESH_COOKIE_NAME};
pub use service::{AuthService, Session};
