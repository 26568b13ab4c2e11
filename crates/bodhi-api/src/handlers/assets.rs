//! Text-asset reads: ranges, creators, tag joins, full-text search.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use bodhi_core::defaults::{
    COL_CATEGORY, COL_CREATOR, COL_ID_ON_CHAIN, COL_INDEX, COL_NAME, COL_TYPE, INDEXER_NAME,
    SEARCHABLE_TABLES, SPACE_INDEXER_SUFFIX, TABLE_INDEXER, TABLE_TEXT_ASSETS,
};
use bodhi_core::{shape_rows, Row, RowQuery};
use bodhi_db::validate_identifier;

use crate::error::ApiError;
use crate::query_types::{flag_present, non_empty, parse_int, parse_positive};
use crate::services::join_text_assets;
use crate::state::AppState;

const MISSING_PARAMS: &str = "Missing required parameters";

#[derive(Debug, Deserialize)]
pub struct AssetRangeQuery {
    pub asset_begin: Option<String>,
    pub asset_end: Option<String>,
    pub only_title: Option<String>,
}

/// Text assets with `asset_begin <= id_on_chain <= asset_end`, ascending.
/// An inverted range is passed through and yields no rows.
///
/// GET /assets?asset_begin=A&asset_end=B[&only_title]
pub async fn assets_by_range(
    State(state): State<AppState>,
    Query(params): Query<AssetRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let (begin, end) = match (parse_int(&params.asset_begin), parse_int(&params.asset_end)) {
        (Some(begin), Some(end)) => (begin, end),
        _ => return Err(ApiError::bad_request("Invalid asset range provided")),
    };

    let rows = state
        .store
        .select(
            &RowQuery::table(TABLE_TEXT_ASSETS)
                .gte(COL_ID_ON_CHAIN, begin)
                .lte(COL_ID_ON_CHAIN, end)
                .order_by(COL_ID_ON_CHAIN, true),
        )
        .await
        .map_err(ApiError::backend("Failed to fetch assets"))?;

    let assets = shape_rows(rows, flag_present(&params.only_title));
    Ok(Json(json!({ "assets": assets })))
}

#[derive(Debug, Deserialize)]
pub struct SpaceQuery {
    pub space_addr: Option<String>,
    pub only_title: Option<String>,
}

/// Text assets created by a space contract.
///
/// GET /assets_by_space?space_addr=ADDR[&only_title]
pub async fn assets_by_space(
    State(state): State<AppState>,
    Query(params): Query<SpaceQuery>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let creator =
        non_empty(&params.space_addr).ok_or_else(|| ApiError::bad_request(MISSING_PARAMS))?;
    let rows = state
        .store
        .select(&RowQuery::table(TABLE_TEXT_ASSETS).eq(COL_CREATOR, creator))
        .await
        .map_err(ApiError::backend("Failed to fetch assets"))?;
    Ok(Json(shape_rows(rows, flag_present(&params.only_title))))
}

#[derive(Debug, Deserialize)]
pub struct SpaceIndexerQuery {
    pub space_addr: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
}

/// Text assets tagged by a space's indexer table `<space_addr>_indexer`,
/// optionally narrowed by `type` and `category`.
///
/// GET /assets_by_space_v2?space_addr=ADDR[&type=T][&category=C]
pub async fn assets_by_space_v2(
    State(state): State<AppState>,
    Query(params): Query<SpaceIndexerQuery>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let space =
        non_empty(&params.space_addr).ok_or_else(|| ApiError::bad_request(MISSING_PARAMS))?;
    let table = format!("{}{}", space, SPACE_INDEXER_SUFFIX);
    validate_identifier(&table).map_err(|_| ApiError::bad_request("Invalid space address"))?;

    let mut query = RowQuery::table(table);
    if let Some(kind) = non_empty(&params.kind) {
        query = query.eq(COL_TYPE, kind);
    }
    if let Some(category) = non_empty(&params.category) {
        query = query.eq(COL_CATEGORY, category);
    }

    let rows = join_text_assets(state.store.as_ref(), query)
        .await
        .map_err(ApiError::backend("Failed to fetch data"))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct TableNameQuery {
    pub table_name: Option<String>,
}

/// Text assets tagged by an arbitrary indexer-style table. The name only has
/// to be a plain, non-system identifier.
///
/// GET /assets_by_table_name?table_name=NAME
pub async fn assets_by_table_name(
    State(state): State<AppState>,
    Query(params): Query<TableNameQuery>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let table =
        non_empty(&params.table_name).ok_or_else(|| ApiError::bad_request(MISSING_PARAMS))?;
    validate_identifier(table).map_err(|_| ApiError::bad_request("Invalid table name"))?;

    let rows = join_text_assets(state.store.as_ref(), RowQuery::table(table))
        .await
        .map_err(ApiError::backend("Failed to fetch data"))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct TextSearchQuery {
    pub keyword: Option<String>,
    pub table_name: Option<String>,
    pub column: Option<String>,
    pub limit: Option<String>,
    pub only_title: Option<String>,
}

/// Full-text search over one of the searchable tables, newest asset first.
///
/// The table allow-list is checked before anything else; a refused table
/// never reaches the backend.
///
/// GET /text_search?keyword=K&table_name=T&column=C[&limit=L][&only_title]
pub async fn text_search(
    State(state): State<AppState>,
    Query(params): Query<TextSearchQuery>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let table = params.table_name.as_deref().unwrap_or_default();
    if !SEARCHABLE_TABLES.contains(&table) {
        debug!(subsystem = "api", db_table = %table, "Refused text search table");
        return Err(ApiError::forbidden("The specified table is not searchable."));
    }

    let (keyword, column) = match (non_empty(&params.keyword), non_empty(&params.column)) {
        (Some(keyword), Some(column)) => (keyword, column),
        _ => return Err(ApiError::bad_request(MISSING_PARAMS)),
    };
    validate_identifier(column).map_err(|_| ApiError::bad_request("Invalid column name"))?;

    let mut query = RowQuery::table(table)
        .text_search(column, keyword)
        .order_by(COL_ID_ON_CHAIN, false);
    if let Some(limit) = parse_positive(&params.limit) {
        query = query.limit(limit);
    }

    let rows = state
        .store
        .select(&query)
        .await
        .map_err(ApiError::backend("Failed to fetch data"))?;
    Ok(Json(shape_rows(rows, flag_present(&params.only_title))))
}

/// Progress of the Bodhi indexer.
///
/// GET /assets_index_latest
pub async fn assets_index_latest(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let row = state
        .store
        .select_single(
            &RowQuery::table(TABLE_INDEXER)
                .columns(&[COL_INDEX])
                .eq(COL_NAME, INDEXER_NAME),
        )
        .await
        .map_err(ApiError::backend("Failed to fetch the latest index"))?;
    let index = row.get(COL_INDEX).cloned().unwrap_or(Value::Null);
    Ok(Json(json!({ "index": index })))
}
