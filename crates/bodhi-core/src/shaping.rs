//! Row shaping applied before text assets leave the service.
//!
//! In title-only mode the full `content` is replaced by a one-line
//! `abstract`; otherwise the (large) `embedding` vector is stripped. A shaped
//! row therefore never carries both the content and the embedding.

use serde_json::Value;

use crate::defaults::{COL_ABSTRACT, COL_CONTENT, COL_EMBEDDING};
use crate::models::Row;

/// Text before the first line break.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("")
}

/// Shape a single row.
///
/// Absent or non-string content yields an empty abstract, never an error.
pub fn shape_row(mut row: Row, title_only: bool) -> Row {
    if title_only {
        let abstract_text = match row.remove(COL_CONTENT) {
            Some(Value::String(content)) => first_line(&content).to_string(),
            _ => String::new(),
        };
        row.insert(COL_ABSTRACT.to_string(), Value::String(abstract_text));
    } else {
        row.remove(COL_EMBEDDING);
    }
    row
}

/// Shape every row of a result set.
pub fn shape_rows(rows: Vec<Row>, title_only: bool) -> Vec<Row> {
    rows.into_iter().map(|r| shape_row(r, title_only)).collect()
}
