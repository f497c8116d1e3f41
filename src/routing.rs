//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::json;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, get_account_endpoint,
        list_accounts_endpoint, update_account_endpoint,
    },
    auth::{AuthState, auth_guard, get_current_user, post_log_in, register_user},
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    credit_card::{
        create_credit_card_endpoint, delete_credit_card_endpoint, get_credit_card_endpoint,
        list_credit_cards_endpoint, update_credit_card_endpoint,
    },
    endpoints,
    recurring::{
        create_recurring_endpoint, delete_recurring_endpoint, generate_recurring_endpoint,
        get_recurring_endpoint, list_recurring_endpoint, update_recurring_endpoint,
    },
    report::{
        account_report_endpoint, cash_flow_endpoint, category_report_endpoint,
        income_statement_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, pay_transaction_endpoint, unpay_transaction_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::USERS, post(register_user));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .put(update_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::CREDIT_CARDS,
            get(list_credit_cards_endpoint).post(create_credit_card_endpoint),
        )
        .route(
            endpoints::CREDIT_CARD,
            get(get_credit_card_endpoint)
                .put(update_credit_card_endpoint)
                .delete(delete_credit_card_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::PAY_TRANSACTION, patch(pay_transaction_endpoint))
        .route(
            endpoints::UNPAY_TRANSACTION,
            patch(unpay_transaction_endpoint),
        )
        .route(
            endpoints::RECURRING,
            get(list_recurring_endpoint).post(create_recurring_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION,
            get(get_recurring_endpoint)
                .put(update_recurring_endpoint)
                .delete(delete_recurring_endpoint),
        )
        .route(
            endpoints::GENERATE_RECURRING,
            post(generate_recurring_endpoint),
        )
        .route(endpoints::CASH_FLOW_REPORT, get(cash_flow_endpoint))
        .route(
            endpoints::INCOME_STATEMENT_REPORT,
            get(income_statement_endpoint),
        )
        .route(endpoints::CATEGORY_REPORT, get(category_report_endpoint))
        .route(endpoints::ACCOUNT_REPORT, get(account_report_endpoint))
        .route_layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
