//! Defines the REST endpoints for recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
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
    transaction::Transaction,
};

use super::core::{
    RECURRING_SORT, RecurringData, RecurringTransaction, create_recurring, delete_recurring,
    generate_transactions, get_recurring, get_recurring_page, update_recurring,
};

/// The state needed by the recurring transaction endpoints.
#[derive(Debug, Clone)]
pub struct RecurringState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<RecurringData>,
) -> Result<(StatusCode, Json<RecurringTransaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let recurring = create_recurring(user_id, &data, &connection)?;

    Ok((StatusCode::CREATED, Json(recurring)))
}

pub async fn list_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<RecurringTransaction>>, Error> {
    let request = query.resolve(&state.pagination_config, &RECURRING_SORT)?;
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_page(user_id, &request, &connection).map(Json)
}

pub async fn get_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<DatabaseId>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring(recurring_id, user_id, &connection).map(Json)
}

pub async fn update_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<DatabaseId>,
    Json(data): Json<RecurringData>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_recurring(recurring_id, user_id, &data, &connection).map(Json)
}

pub async fn delete_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_recurring(recurring_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// The request body for generating the transactions of a recurring transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateData {
    /// Generate occurrences up to and including this date.
    pub until: Date,
}

/// A route handler for generating the pending transactions of a recurring transaction.
///
/// Responds with "201 Created" and the new transactions, or "200 OK" and an
/// empty list if every occurrence already exists.
pub async fn generate_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<DatabaseId>,
    Json(data): Json<GenerateData>,
) -> Result<(StatusCode, Json<Vec<Transaction>>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let created = generate_transactions(recurring_id, user_id, data.until, &connection)?;

    let status = if created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(created)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::TestApp,
    };

    #[tokio::test]
    async fn generate_endpoint_is_idempotent() {
        let app = TestApp::new();
        let response = app
            .server
            .post(endpoints::RECURRING)
            .authorization_bearer(&app.token)
            .json(&json!({
                "kind": "income",
                "amount": 3000,
                "description": "Salary",
                "frequency": "fortnightly",
                "start_date": "2026-01-02"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_i64().unwrap();
        let path = format_endpoint(endpoints::GENERATE_RECURRING, id);

        let response = app
            .server
            .post(&path)
            .authorization_bearer(&app.token)
            .json(&json!({ "until": "2026-01-31" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Value>();
        assert_eq!(created[0]["date"], "2026-01-02");
        assert_eq!(created[1]["date"], "2026-01-16");
        assert_eq!(created[2]["date"], "2026-01-30");
        assert_eq!(created.as_array().unwrap().len(), 3);

        let response = app
            .server
            .post(&path)
            .authorization_bearer(&app.token)
            .json(&json!({ "until": "2026-01-31" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!([]));
    }

    #[tokio::test]
    async fn generate_for_missing_template_is_not_found() {
        let app = TestApp::new();

        app.server
            .post(&format_endpoint(endpoints::GENERATE_RECURRING, 7))
            .authorization_bearer(&app.token)
            .json(&json!({ "until": "2026-01-31" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_frequency_is_rejected() {
        let app = TestApp::new();

        let response = app
            .server
            .post(endpoints::RECURRING)
            .authorization_bearer(&app.token)
            .json(&json!({
                "kind": "income",
                "amount": 10,
                "frequency": "hourly",
                "start_date": "2026-01-02"
            }))
            .await;

        assert!(response.status_code().is_client_error());
    }
}
