//! Image assets: listings, category updates, batch classification.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use bodhi_core::defaults::{
    COL_CATEGORY, COL_CREATED_AT, COL_ID, COL_ID_ON_CHAIN, IMG_PAGE, IMG_PAGE_LIMIT,
    TABLE_IMG_ASSETS,
};
use bodhi_core::{Row, RowQuery};

use crate::error::ApiError;
use crate::query_types::{non_empty, parse_int, parse_positive};
use crate::services::classify_pending;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
}

/// Newest images first. A non-zero integer cursor keeps ids up to and
/// including the cursor.
///
/// GET /imgs?cursor=C&limit=L&category=CAT
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<CursorQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = parse_positive(&params.limit).unwrap_or(IMG_PAGE_LIMIT);

    let mut query = RowQuery::table(TABLE_IMG_ASSETS)
        .order_by(COL_CREATED_AT, false)
        .limit(limit);
    if let Some(cursor) = parse_int(&params.cursor).filter(|c| *c != 0) {
        query = query.lt(COL_ID, cursor.saturating_add(1));
    }
    if let Some(category) = non_empty(&params.category) {
        query = query.eq(COL_CATEGORY, category);
    }

    let images = state
        .store
        .select(&query)
        .await
        .map_err(ApiError::backend("Failed to fetch images"))?;
    Ok(Json(json!({ "images": images })))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
}

/// Offset pagination by descending id. Missing, invalid, or non-positive
/// `page`/`limit` fall back to 1 and 10.
///
/// GET /imgs_page?page=P&limit=L&category=CAT
pub async fn list_images_page(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = parse_positive(&params.page).unwrap_or(IMG_PAGE);
    let limit = parse_positive(&params.limit).unwrap_or(IMG_PAGE_LIMIT);
    let offset = (page - 1).saturating_mul(limit);

    let mut query = RowQuery::table(TABLE_IMG_ASSETS)
        .order_by(COL_ID, false)
        .range(offset, offset.saturating_add(limit - 1));
    if let Some(category) = non_empty(&params.category) {
        query = query.eq(COL_CATEGORY, category);
    }

    let images = state
        .store
        .select(&query)
        .await
        .map_err(ApiError::backend("Failed to fetch images"))?;
    Ok(Json(json!({ "images": images, "page": page, "limit": limit })))
}

/// Highest image id, or null for an empty table.
///
/// GET /imgs_latest_id
pub async fn latest_image_id(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = state
        .store
        .select(
            &RowQuery::table(TABLE_IMG_ASSETS)
                .columns(&[COL_ID])
                .order_by(COL_ID, false)
                .limit(1),
        )
        .await
        .map_err(ApiError::backend("Failed to fetch the latest ID"))?;

    let latest_id = rows
        .first()
        .and_then(|row| row.get(COL_ID).cloned())
        .unwrap_or(Value::Null);
    Ok(Json(json!({ "latestId": latest_id })))
}

#[derive(Debug, Deserialize)]
pub struct SetCategoryQuery {
    pub asset_id: Option<String>,
    pub category: Option<String>,
    pub admin_key: Option<String>,
}

/// Set the category of every image row for an on-chain asset.
///
/// The admin key is checked before the other parameters; a mismatch never
/// reaches the backend.
///
/// GET /set_img?asset_id=ID&category=CAT&admin_key=KEY
pub async fn set_image_category(
    State(state): State<AppState>,
    Query(params): Query<SetCategoryQuery>,
) -> Result<Json<Value>, ApiError> {
    if !state.admin_key_matches(params.admin_key.as_deref()) {
        warn!(subsystem = "api", op = "set_img", "Rejected admin key");
        return Err(ApiError::forbidden("Unauthorized"));
    }

    let asset_id = parse_int(&params.asset_id).filter(|id| *id != 0);
    let (asset_id, category) = match (asset_id, non_empty(&params.category)) {
        (Some(asset_id), Some(category)) => (asset_id, category),
        _ => return Err(ApiError::bad_request("Missing required parameters")),
    };

    let mut patch = Row::new();
    patch.insert(COL_CATEGORY.to_string(), Value::String(category.to_string()));
    let updated = state
        .store
        .update(
            &RowQuery::table(TABLE_IMG_ASSETS).eq(COL_ID_ON_CHAIN, asset_id),
            patch,
        )
        .await
        .map_err(ApiError::backend("Failed to update category"))?;

    info!(
        subsystem = "api",
        op = "set_img",
        asset_id,
        result_count = updated.len(),
        "Image category updated"
    );
    Ok(Json(json!({
        "message": "Category updated successfully",
        "data": updated,
    })))
}

/// Classify every pending key/value text asset.
///
/// GET /batch_to_img
pub async fn batch_to_img(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    classify_pending(state.store.as_ref())
        .await
        .map_err(ApiError::backend("Failed to fetch text assets"))?;
    Ok(Json(json!({ "result": "batch to img done" })))
}
