//! User registration, password hashing and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use log_in::{LogInData, TokenResponse, post_log_in};
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{RegisterData, get_current_user, register_user};
pub use token::{Claims, JwtKeys, decode_token, encode_token};
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id,
    update_password,
};
