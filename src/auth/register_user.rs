//! Routes for registering a new user and fetching the current user.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{
        PasswordHash, ValidatedPassword,
        user::{User, UserID, create_user, get_user_by_id},
    },
};

/// The state needed to register users.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The request body for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email address to log in with.
    pub email: String,
    /// The plain text password, which must be strong enough.
    pub password: String,
}

/// A route handler for registering a new user.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidEmail] if the email address cannot be parsed,
/// - [Error::TooWeak] if the password is too easy to guess,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or an internal error if hashing or the database fails.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(data): Json<RegisterData>,
) -> Result<(StatusCode, Json<User>), Error> {
    let email = EmailAddress::from_str(data.email.trim())
        .map_err(|error| Error::InvalidEmail(error.to_string()))?;
    let email = email.to_string();

    let password = ValidatedPassword::new(&data.password, &[email.as_str()])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(&email, password_hash, &connection)?;
    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// A route handler for getting the user that owns the bearer token.
pub async fn get_current_user(
    State(state): State<RegistrationState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_id(user_id, &connection).map(Json)
}
