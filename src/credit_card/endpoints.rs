//! Defines the REST endpoints for credit cards.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::UserID,
    credit_card::core::{
        CREDIT_CARD_SORT, CreditCard, CreditCardData, create_credit_card, delete_credit_card,
        get_credit_card, get_credit_cards_page, update_credit_card,
    },
    database_id::DatabaseId,
    pagination::{Page, PaginationConfig, PaginationQuery},
};

/// The state needed by the credit card endpoints.
#[derive(Debug, Clone)]
pub struct CreditCardState {
    /// The database connection for managing credit cards.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page lists of credit cards.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CreditCardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

pub async fn create_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CreditCardData>,
) -> Result<(StatusCode, Json<CreditCard>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let card = create_credit_card(user_id, &data, &connection)?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn list_credit_cards_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<CreditCard>>, Error> {
    let request = query.resolve(&state.pagination_config, &CREDIT_CARD_SORT)?;
    let connection = lock_connection(&state.db_connection)?;

    get_credit_cards_page(user_id, &request, &connection).map(Json)
}

pub async fn get_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(credit_card_id): Path<DatabaseId>,
) -> Result<Json<CreditCard>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_credit_card(credit_card_id, user_id, &connection).map(Json)
}

pub async fn update_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(credit_card_id): Path<DatabaseId>,
    Json(data): Json<CreditCardData>,
) -> Result<Json<CreditCard>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_credit_card(credit_card_id, user_id, &data, &connection).map(Json)
}

pub async fn delete_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(credit_card_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_credit_card(credit_card_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
