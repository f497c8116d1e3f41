//! Defines the REST endpoints for the financial reports.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, account::get_accounts, app_state::lock_connection, auth::UserID,
    timezone::local_today,
};

use super::{
    breakdown::{AccountBreakdown, CategoryBreakdown, build_account_breakdown, build_category_breakdown},
    cash_flow::{CashFlowReport, build_cash_flow},
    filter::{ReportFilter, ReportQuery},
    income_statement::{IncomeStatement, build_income_statement},
    rows::{fetch_opening_balance, fetch_report_rows},
};

/// The state needed by the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to decide the current month for reports without dates.
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A report together with the filter it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse<T> {
    pub filter: ReportFilter,
    #[serde(flatten)]
    pub report: T,
}

fn resolve_filter(state: &ReportState, query: ReportQuery) -> Result<ReportFilter, Error> {
    let today = local_today(&state.local_timezone)?;

    ReportFilter::from_query(query, today)
}

pub async fn cash_flow_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<CashFlowReport>>, Error> {
    let filter = resolve_filter(&state, query)?;
    let connection = lock_connection(&state.db_connection)?;

    let rows = fetch_report_rows(&filter, user_id, &connection)?;
    let opening_balance = fetch_opening_balance(&filter, user_id, &connection)?;
    let report = build_cash_flow(&filter, &rows, opening_balance);

    Ok(Json(ReportResponse { filter, report }))
}

pub async fn income_statement_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<IncomeStatement>>, Error> {
    let filter = resolve_filter(&state, query)?;
    let connection = lock_connection(&state.db_connection)?;

    let rows = fetch_report_rows(&filter, user_id, &connection)?;
    let report = build_income_statement(&filter, &rows);

    Ok(Json(ReportResponse { filter, report }))
}

pub async fn category_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<CategoryBreakdown>>, Error> {
    let filter = resolve_filter(&state, query)?;
    let connection = lock_connection(&state.db_connection)?;

    let rows = fetch_report_rows(&filter, user_id, &connection)?;
    let report = build_category_breakdown(&rows);

    Ok(Json(ReportResponse { filter, report }))
}

pub async fn account_report_endpoint(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse<AccountBreakdown>>, Error> {
    let filter = resolve_filter(&state, query)?;
    let connection = lock_connection(&state.db_connection)?;

    let rows = fetch_report_rows(&filter, user_id, &connection)?;
    let mut accounts = get_accounts(user_id, &connection)?;
    if let Some(account_ids) = &filter.account_ids {
        accounts.retain(|account| account_ids.contains(&account.id));
    }
    let report = build_account_breakdown(&rows, &accounts);

    Ok(Json(ReportResponse { filter, report }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::TestApp};

    async fn create(app: &TestApp, path: &str, body: Value) -> i64 {
        let response = app
            .server
            .post(path)
            .authorization_bearer(&app.token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().unwrap()
    }

    async fn seed(app: &TestApp) -> (i64, i64) {
        let account_id = create(
            app,
            endpoints::ACCOUNTS,
            json!({ "name": "Everyday", "kind": "checking", "initial_balance": 500 }),
        )
        .await;
        let category_id = create(
            app,
            endpoints::CATEGORIES,
            json!({ "name": "Rent", "kind": "expense" }),
        )
        .await;

        create(
            app,
            endpoints::TRANSACTIONS,
            json!({
                "kind": "income",
                "amount": 2000,
                "date": "2026-01-10",
                "paid": true,
                "paid_at": "2026-01-10",
                "account_id": account_id
            }),
        )
        .await;
        create(
            app,
            endpoints::TRANSACTIONS,
            json!({
                "kind": "expense",
                "amount": 800,
                "date": "2026-01-15",
                "paid": true,
                "paid_at": "2026-02-01",
                "account_id": account_id,
                "category_id": category_id
            }),
        )
        .await;
        // Unpaid, only counted with include_unpaid.
        create(
            app,
            endpoints::TRANSACTIONS,
            json!({
                "kind": "expense",
                "amount": 100,
                "date": "2026-01-20",
                "account_id": account_id
            }),
        )
        .await;

        (account_id, category_id)
    }

    #[tokio::test]
    async fn cash_flow_uses_payment_dates() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .server
            .get(endpoints::CASH_FLOW_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-02-28")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["filter"]["regime"], "cash");
        assert_eq!(body["opening_balance"], 500.0);
        assert_eq!(body["periods"][0]["income"], 2000.0);
        assert_eq!(body["periods"][0]["expense"], 0.0);
        assert_eq!(body["periods"][1]["expense"], 800.0);
        assert_eq!(body["closing_balance"], 1700.0);
    }

    #[tokio::test]
    async fn accrual_and_unpaid_change_totals() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .server
            .get(endpoints::CASH_FLOW_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-01-31")
            .add_query_param("regime", "accrual")
            .add_query_param("include_unpaid", "true")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["totals"]["income"], 2000.0);
        assert_eq!(body["totals"]["expense"], 900.0);
        assert_eq!(body["totals"]["net"], 1100.0);
    }

    #[tokio::test]
    async fn income_statement_groups_by_category() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .server
            .get(endpoints::INCOME_STATEMENT_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-01-31")
            .add_query_param("regime", "accrual")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["gross_revenue"], 2000.0);
        assert_eq!(body["expenses"][0]["category"], "Rent");
        assert_eq!(body["expenses"][0]["percent"], 40.0);
        assert_eq!(body["net_result"], 1200.0);
        assert_eq!(body["net_margin"], 60.0);
    }

    #[tokio::test]
    async fn category_report_can_be_scoped() {
        let app = TestApp::new();
        let (_, category_id) = seed(&app).await;

        let response = app
            .server
            .get(endpoints::CATEGORY_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-02-28")
            .add_query_param("category_ids", category_id.to_string())
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["total_income"], 0.0);
        assert_eq!(body["total_expense"], 800.0);
        assert_eq!(body["expense"][0]["count"], 1);
    }

    #[tokio::test]
    async fn account_report_lists_accounts() {
        let app = TestApp::new();
        seed(&app).await;

        let response = app
            .server
            .get(endpoints::ACCOUNT_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-02-28")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["accounts"][0]["account"], "Everyday");
        assert_eq!(body["accounts"][0]["net"], 1200.0);
        assert_eq!(body["accounts"][0]["expense_percent"], 100.0);
    }

    #[tokio::test]
    async fn empty_report_has_zero_totals() {
        let app = TestApp::new();

        let response = app
            .server
            .get(endpoints::INCOME_STATEMENT_REPORT)
            .authorization_bearer(&app.token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["gross_revenue"], 0.0);
        assert_eq!(body["net_margin"], 0.0);
        assert_eq!(body["periods"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_filters_are_bad_requests() {
        let app = TestApp::new();

        app.server
            .get(endpoints::CASH_FLOW_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2026-03-01")
            .add_query_param("end_date", "2026-01-01")
            .await
            .assert_status_bad_request();

        app.server
            .get(endpoints::CASH_FLOW_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("start_date", "2024-01-01")
            .add_query_param("end_date", "2025-06-01")
            .add_query_param("granularity", "daily")
            .await
            .assert_status_bad_request();

        app.server
            .get(endpoints::CATEGORY_REPORT)
            .authorization_bearer(&app.token)
            .add_query_param("category_ids", "one,two")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn reports_only_include_own_transactions() {
        let app = TestApp::new();
        seed(&app).await;
        let other_token = app.token_for_new_user("other@example.com");

        let response = app
            .server
            .get(endpoints::CASH_FLOW_REPORT)
            .authorization_bearer(&other_token)
            .add_query_param("start_date", "2026-01-01")
            .add_query_param("end_date", "2026-02-28")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["totals"]["income"], 0.0);
        assert_eq!(body["opening_balance"], 0.0);
    }
}
