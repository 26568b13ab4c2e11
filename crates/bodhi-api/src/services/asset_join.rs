//! Tag join between an indexer-style table and the text assets.
//!
//! ## Flow
//!
//! 1. Read the tag rows (`id_on_chain`, `category`, `type`) from the
//!    indexer table, optionally filtered.
//! 2. Read the text assets whose `id_on_chain` is in that set.
//! 3. Overlay each asset with its tags. The tag table wins on conflicting
//!    `category`/`type` columns; for duplicate ids the last tag row wins.

use std::collections::HashMap;

use tracing::debug;

use bodhi_core::defaults::{COL_ID_ON_CHAIN, TABLE_TEXT_ASSETS};
use bodhi_core::{row_i64, AssetTags, FilterValue, Result, Row, RowQuery, RowStore};

/// Run both queries and return the tagged text assets.
///
/// An empty tag set short-circuits to an empty result without a second
/// backend call.
pub async fn join_text_assets(store: &dyn RowStore, tags_query: RowQuery) -> Result<Vec<Row>> {
    let tag_rows = store.select(&tags_query).await?;

    let mut ids: Vec<i64> = tag_rows
        .iter()
        .filter_map(|row| row_i64(row, COL_ID_ON_CHAIN))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    debug!(
        subsystem = "api",
        component = "asset_join",
        db_table = %tags_query.table,
        result_count = ids.len(),
        "Tag rows loaded"
    );

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let assets = store
        .select(&RowQuery::table(TABLE_TEXT_ASSETS).in_list(
            COL_ID_ON_CHAIN,
            ids.into_iter().map(FilterValue::from).collect(),
        ))
        .await?;

    Ok(merge_tags(&tag_rows, assets))
}

/// Overlay `category` and `type` from `tag_rows` onto `assets`, keyed by
/// `id_on_chain`. Assets without a matching tag row pass through unchanged.
pub fn merge_tags(tag_rows: &[Row], assets: Vec<Row>) -> Vec<Row> {
    let tags: HashMap<i64, AssetTags> = tag_rows
        .iter()
        .filter_map(|row| Some((row_i64(row, COL_ID_ON_CHAIN)?, AssetTags::from_row(row))))
        .collect();

    assets
        .into_iter()
        .map(|mut asset| {
            if let Some(t) = row_i64(&asset, COL_ID_ON_CHAIN).and_then(|id| tags.get(&id)) {
                t.apply(&mut asset);
            }
            asset
        })
        .collect()
}
