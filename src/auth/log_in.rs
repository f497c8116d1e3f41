//! This file defines the route for exchanging an email and password for a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use jsonwebtoken::EncodingKey;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{token::encode_token, user::get_user_by_email},
};

/// The state needed to log in a user.
#[derive(Clone)]
pub struct LogInState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key for signing new tokens.
    pub encoding_key: EncodingKey,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            encoding_key: state.jwt_keys.encoding_key.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// The credentials entered during log-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The body of a successful log-in response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token to send in the `Authorization` header.
    pub token: String,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the token.
pub async fn post_log_in(
    State(state): State<LogInState>,
    Json(credentials): Json<LogInData>,
) -> Result<Json<TokenResponse>, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(credentials.email.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_correct = user
        .password_hash
        .verify(&credentials.password)?;

    if !is_password_correct {
        tracing::info!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(user.id, state.token_duration, &state.encoding_key)?;

    Ok(Json(TokenResponse { token }))
}
