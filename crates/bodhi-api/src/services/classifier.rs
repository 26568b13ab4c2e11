//! Batch image classifier for key/value text assets.
//!
//! Every unclassified row (`if_to_img_assets = 0`) is scanned for a markdown
//! image reference. Rows with an image get an image-asset row and flag 2;
//! the rest get flag 1. Rows are handled one at a time: a row's insert and
//! flag update finish before the next row starts.
//!
//! The flag update runs even when the image insert failed, so a row can end
//! up flagged 2 with no image asset. Per-row failures are logged and counted
//! and never stop the batch.

use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use bodhi_core::defaults::{COL_DATA, COL_ID, COL_IMG_FLAG, TABLE_IMG_ASSETS, TABLE_TEXT_ASSETS_KV};
use bodhi_core::{
    contains_image, extract_image_link, row_i64, row_str, ClassificationFlag, NewImageAsset,
    Result, Row, RowQuery, RowStore,
};

/// Counts from one classifier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub scanned: usize,
    pub images: usize,
    pub plain: usize,
    pub insert_failures: usize,
    pub update_failures: usize,
}

/// Classify every pending row.
///
/// Only the initial selection can fail the call; everything after it is
/// best-effort.
pub async fn classify_pending(store: &dyn RowStore) -> Result<BatchSummary> {
    let start = Instant::now();
    let pending = store
        .select(
            &RowQuery::table(TABLE_TEXT_ASSETS_KV)
                .eq(COL_IMG_FLAG, ClassificationFlag::Unclassified.as_i64()),
        )
        .await?;

    let mut summary = BatchSummary::default();
    for row in pending {
        classify_row(store, &row, &mut summary).await;
    }

    info!(
        subsystem = "api",
        component = "classifier",
        op = "batch_to_img",
        scanned = summary.scanned,
        images = summary.images,
        plain = summary.plain,
        insert_failures = summary.insert_failures,
        update_failures = summary.update_failures,
        duration_ms = start.elapsed().as_millis() as u64,
        "Batch classification complete"
    );
    Ok(summary)
}

async fn classify_row(store: &dyn RowStore, row: &Row, summary: &mut BatchSummary) {
    summary.scanned += 1;
    let row_id = row_i64(row, COL_ID);
    let markdown = row_str(row, COL_DATA).unwrap_or("");
    let flag = ClassificationFlag::for_detection(contains_image(markdown));

    debug!(
        subsystem = "api",
        component = "classifier",
        row_id = ?row_id,
        flag = flag.as_i64(),
        "Classifying row"
    );

    if flag == ClassificationFlag::Image {
        summary.images += 1;
        let asset = NewImageAsset::from_text_asset(row, extract_image_link(markdown));
        if let Err(e) = store.insert(TABLE_IMG_ASSETS, vec![asset.into_row()]).await {
            summary.insert_failures += 1;
            warn!(
                subsystem = "api",
                component = "classifier",
                db_table = TABLE_IMG_ASSETS,
                row_id = ?row_id,
                error = %e,
                "Image asset insert failed"
            );
        }
    } else {
        summary.plain += 1;
    }

    let Some(id) = row_id else {
        summary.update_failures += 1;
        warn!(
            subsystem = "api",
            component = "classifier",
            db_table = TABLE_TEXT_ASSETS_KV,
            "Row has no id; flag not updated"
        );
        return;
    };

    let mut patch = Row::new();
    patch.insert(COL_IMG_FLAG.to_string(), json!(flag.as_i64()));
    if let Err(e) = store
        .update(&RowQuery::table(TABLE_TEXT_ASSETS_KV).eq(COL_ID, id), patch)
        .await
    {
        summary.update_failures += 1;
        warn!(
            subsystem = "api",
            component = "classifier",
            db_table = TABLE_TEXT_ASSETS_KV,
            row_id = id,
            error = %e,
            "Flag update failed"
        );
    }
}
