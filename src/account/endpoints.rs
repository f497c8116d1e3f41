//! Defines the REST endpoints for bank accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::core::{
        ACCOUNT_SORT, Account, AccountData, create_account, delete_account, get_account,
        get_accounts_page, update_account,
    },
    app_state::lock_connection,
    auth::UserID,
    database_id::DatabaseId,
    pagination::{Page, PaginationConfig, PaginationQuery},
};

/// The state needed by the account endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page lists of accounts.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for creating a new account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<AccountData>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = create_account(user_id, &data, &connection)?;
    tracing::debug!("Created account {} for user {user_id}", account.id);

    Ok((StatusCode::CREATED, Json(account)))
}

/// A route handler for listing a page of the user's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<Account>>, Error> {
    let request = query.resolve(&state.pagination_config, &ACCOUNT_SORT)?;
    let connection = lock_connection(&state.db_connection)?;

    get_accounts_page(user_id, &request, &connection).map(Json)
}

/// A route handler for getting a single account.
pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<DatabaseId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_account(account_id, user_id, &connection).map(Json)
}

/// A route handler for replacing an account.
pub async fn update_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<DatabaseId>,
    Json(data): Json<AccountData>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_account(account_id, user_id, &data, &connection).map(Json)
}

/// A route handler for deleting an account, responds with "204 No Content".
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_account(account_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
