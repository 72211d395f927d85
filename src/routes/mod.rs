mod auth;
mod health_check;
mod users;

pub use auth::{login, logout, refresh, LoginRequest, LoginResponse};
pub use health_check::health_check;
pub use users::{create_user, delete_current_user, get_user, CreateUserRequest};
