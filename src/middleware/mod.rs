/// Middleware module
///
/// Request authentication for protected routes.

mod auth_guard;

pub use auth_guard::AuthGuard;
