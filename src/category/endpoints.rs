//! Defines the REST endpoints for categories.

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
    category::core::{
        CATEGORY_SORT, Category, CategoryData, create_category, delete_category, get_categories_page,
        get_category, update_category,
    },
    database_id::DatabaseId,
    pagination::{Page, PaginationConfig, PaginationQuery},
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CategoryData>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(user_id, &data, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Page<Category>>, Error> {
    let request = query.resolve(&state.pagination_config, &CATEGORY_SORT)?;
    let connection = lock_connection(&state.db_connection)?;

    get_categories_page(user_id, &request, &connection).map(Json)
}

pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseId>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, user_id, &connection).map(Json)
}

pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseId>,
    Json(data): Json<CategoryData>,
) -> Result<Json<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_category(category_id, user_id, &data, &connection).map(Json)
}

pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_category(category_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
