//! Defines the REST endpoints for transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::UserID,
    database_id::DatabaseId,
    pagination::{Page, PaginationConfig, PaginationQuery},
};

use super::{
    core::{
        Transaction, TransactionBuilder, create_transaction, delete_transaction, get_transaction,
        pay_transaction, unpay_transaction, update_transaction,
    },
    query::{TRANSACTION_SORT, TransactionFilter, get_transactions_page},
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page lists of transactions.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(builder): Json<TransactionBuilder>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(user_id, builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing a page of transactions.
///
/// Accepts the pagination parameters and the fields of [TransactionFilter]
/// in the query string.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PaginationQuery>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Page<Transaction>>, Error> {
    let request = query.resolve(&state.pagination_config, &TRANSACTION_SORT)?;
    let connection = lock_connection(&state.db_connection)?;

    get_transactions_page(user_id, &filter, &request, &connection).map(Json)
}

pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
    Json(builder): Json<TransactionBuilder>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(transaction_id, user_id, builder, &connection).map(Json)
}

pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// The optional request body for marking a transaction as paid.
#[derive(Debug, Default, Deserialize)]
pub struct PayData {
    /// When the transaction was paid, defaults to the transaction date.
    pub paid_at: Option<Date>,
}

/// A route handler for marking a transaction as paid.
///
/// The body may be empty, in which case the transaction is paid on its date.
pub async fn pay_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
    body: Bytes,
) -> Result<Json<Transaction>, Error> {
    let data = if body.iter().all(u8::is_ascii_whitespace) {
        PayData::default()
    } else {
        serde_json::from_slice::<PayData>(&body).map_err(|error| Error::InvalidField {
            field: "paid_at",
            reason: error.to_string(),
        })?
    };

    let connection = lock_connection(&state.db_connection)?;

    pay_transaction(transaction_id, user_id, data.paid_at, &connection).map(Json)
}

/// A route handler for marking a transaction as unpaid.
pub async fn unpay_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    unpay_transaction(transaction_id, user_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::TestApp,
    };

    async fn create(app: &TestApp, body: Value) -> Value {
        let response = app
            .server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&app.token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn create_and_get_transaction() {
        let app = TestApp::new();

        let created = create(
            &app,
            json!({ "kind": "expense", "amount": 42.5, "description": "Groceries", "date": "2026-03-02" }),
        )
        .await;
        assert_eq!(created["due_date"], "2026-03-02");
        assert_eq!(created["paid"], false);

        let path = format_endpoint(endpoints::TRANSACTION, created["id"].as_i64().unwrap());
        let fetched = app
            .server
            .get(&path)
            .authorization_bearer(&app.token)
            .await
            .json::<Value>();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_transaction_with_too_many_decimals_is_bad_request() {
        let app = TestApp::new();

        app.server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&app.token)
            .json(&json!({ "kind": "income", "amount": 1.005, "date": "2026-03-02" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_transaction_with_missing_account_is_bad_request() {
        let app = TestApp::new();

        let response = app
            .server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&app.token)
            .json(&json!({ "kind": "income", "amount": 1, "date": "2026-03-02", "account_id": 99 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "account 99 does not exist");
    }

    #[tokio::test]
    async fn pay_with_and_without_body() {
        let app = TestApp::new();
        let created = create(
            &app,
            json!({ "kind": "expense", "amount": 10, "date": "2026-03-02" }),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let paid = app
            .server
            .patch(&format_endpoint(endpoints::PAY_TRANSACTION, id))
            .authorization_bearer(&app.token)
            .await;
        paid.assert_status_ok();
        assert_eq!(paid.json::<Value>()["paid_at"], "2026-03-02");

        let paid = app
            .server
            .patch(&format_endpoint(endpoints::PAY_TRANSACTION, id))
            .authorization_bearer(&app.token)
            .json(&json!({ "paid_at": "2026-03-05" }))
            .await
            .json::<Value>();
        assert_eq!(paid["paid"], true);
        assert_eq!(paid["paid_at"], "2026-03-05");

        let unpaid = app
            .server
            .patch(&format_endpoint(endpoints::UNPAY_TRANSACTION, id))
            .authorization_bearer(&app.token)
            .await
            .json::<Value>();
        assert_eq!(unpaid["paid"], false);
        assert_eq!(unpaid["paid_at"], Value::Null);
    }

    #[tokio::test]
    async fn list_transactions_applies_filters() {
        let app = TestApp::new();
        create(&app, json!({ "kind": "expense", "amount": 1, "date": "2026-03-02" })).await;
        create(&app, json!({ "kind": "income", "amount": 2, "date": "2026-03-03" })).await;
        create(&app, json!({ "kind": "income", "amount": 3, "date": "2026-04-03" })).await;

        let response = app
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("kind", "income")
            .add_query_param("end_date", "2026-03-31")
            .authorization_bearer(&app.token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["amount"], 2.0);
    }

    #[tokio::test]
    async fn delete_missing_transaction_is_not_found() {
        let app = TestApp::new();

        app.server
            .delete(&format_endpoint(endpoints::TRANSACTION, 1))
            .authorization_bearer(&app.token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
