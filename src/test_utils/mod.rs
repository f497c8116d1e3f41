#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState,
    auth::{PasswordHash, UserID, create_user, encode_token},
    db::initialize,
    pagination::PaginationConfig,
    routing::build_router,
};

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn create_test_user(email: &str, connection: &Connection) -> UserID {
    create_user(email, PasswordHash::new_unchecked("hunter2"), connection)
        .expect("Could not create test user")
        .id
}

/// A server running the full router with a registered user.
pub(crate) struct TestApp {
    pub server: TestServer,
    /// A valid bearer token for `user_id`.
    pub token: String,
    pub user_id: UserID,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open in-memory database"),
            "test-secret",
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .expect("Could not create app state")
        .with_password_hash_cost(4);

        let user_id = {
            let connection = state.db_connection.lock().unwrap();
            create_test_user("test@example.com", &connection)
        };
        let token = encode_token(user_id, Duration::hours(1), &state.jwt_keys.encoding_key)
            .expect("Could not create token");
        let db_connection = state.db_connection.clone();
        let server =
            TestServer::try_new(build_router(state)).expect("Could not create test server.");

        Self {
            server,
            token,
            user_id,
            db_connection,
        }
    }

    /// Create a bearer token for another user.
    pub(crate) fn token_for_new_user(&self, email: &str) -> String {
        let connection = self.db_connection.lock().unwrap();
        let user_id = create_test_user(email, &connection);

        encode_token(
            user_id,
            Duration::hours(1),
            &crate::auth::JwtKeys::from_secret("test-secret").encoding_key,
        )
        .expect("Could not create token")
    }
}
