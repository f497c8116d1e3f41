//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{JwtKeys, PasswordHash},
    db::initialize,
    pagination::PaginationConfig,
};

/// The default duration for which bearer tokens are valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(1);

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,

    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The config that controls how to page lists of records.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_hash_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
        })
    }

    /// Set how long issued bearer tokens are valid for.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost used when hashing new passwords.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

/// Acquire the lock on the database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock_connection(
    connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
