//! Root, spaces, collections, and constants.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use bodhi_core::defaults::{COL_KEY, COL_NAME, TABLE_COLLECTIONS, TABLE_CONSTANTS, TABLE_SPACES};
use bodhi_core::{Row, RowQuery};

use crate::error::ApiError;
use crate::query_types::non_empty;
use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "result": "Hello World!" }))
}

/// Spaces that have a name.
///
/// GET /spaces
pub async fn list_spaces(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = state
        .store
        .select(&RowQuery::table(TABLE_SPACES).not_null(COL_NAME))
        .await
        .map_err(ApiError::backend("Failed to fetch spaces"))?;
    Ok(Json(rows))
}

/// GET /collections
pub async fn list_collections(State(state): State<AppState>) -> Result<Json<Vec<Row>>, ApiError> {
    let rows = state
        .store
        .select(&RowQuery::table(TABLE_COLLECTIONS))
        .await
        .map_err(ApiError::backend("Failed to fetch collections"))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct ConstantQuery {
    pub key: Option<String>,
}

/// The single constant row for `key`. Zero or several matches are a
/// backend failure, like any other lookup error.
///
/// GET /constant?key=K
pub async fn get_constant(
    State(state): State<AppState>,
    Query(params): Query<ConstantQuery>,
) -> Result<Json<Row>, ApiError> {
    let key = non_empty(&params.key)
        .ok_or_else(|| ApiError::bad_request("Missing required parameters"))?;
    let row = state
        .store
        .select_single(&RowQuery::table(TABLE_CONSTANTS).eq(COL_KEY, key))
        .await
        .map_err(ApiError::backend("Failed to fetch data"))?;
    Ok(Json(row))
}
