//! Row model.
//!
//! Backend rows are read verbatim and reshaped, so they stay untyped JSON
//! objects. The few fields the service interprets get typed accessors here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::{
    COL_CATEGORY, COL_CREATED_AT, COL_CREATOR, COL_ID_ON_CHAIN, COL_LINK, COL_METADATA, COL_TYPE,
};

/// A single backend row.
pub type Row = Map<String, Value>;

/// Read an integer column, accepting JSON numbers and numeric strings.
///
/// PostgREST renders `bigint` as a number while some views return text ids,
/// so both are accepted.
pub fn row_i64(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a string column.
pub fn row_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

/// Image classification state of a key/value text asset.
///
/// Transitions are one-way: `Unclassified` becomes either `NoImage` or
/// `Image` and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ClassificationFlag {
    Unclassified = 0,
    NoImage = 1,
    Image = 2,
}

impl ClassificationFlag {
    /// Flag for a row given whether its markdown embeds an image.
    pub fn for_detection(has_image: bool) -> Self {
        if has_image {
            Self::Image
        } else {
            Self::NoImage
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl From<ClassificationFlag> for i64 {
    fn from(flag: ClassificationFlag) -> Self {
        flag.as_i64()
    }
}

impl TryFrom<i64> for ClassificationFlag {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unclassified),
            1 => Ok(Self::NoImage),
            2 => Ok(Self::Image),
            other => Err(format!("unknown classification flag: {}", other)),
        }
    }
}

/// Row inserted into the image asset table for a text asset that embeds an
/// image. The embedding is never copied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewImageAsset {
    pub id_on_chain: Value,
    pub creator: Value,
    pub created_at: Value,
    pub metadata: Value,
    /// `None` when the image reference has an empty URL.
    pub link: Option<String>,
}

impl NewImageAsset {
    /// Build the image row from a key/value text asset and the extracted link.
    pub fn from_text_asset(source: &Row, link: Option<&str>) -> Self {
        let field = |name: &str| source.get(name).cloned().unwrap_or(Value::Null);
        Self {
            id_on_chain: field(COL_ID_ON_CHAIN),
            creator: field(COL_CREATOR),
            created_at: field(COL_CREATED_AT),
            metadata: field(COL_METADATA),
            link: link.map(str::to_string),
        }
    }

    pub fn into_row(self) -> Row {
        let mut row = Row::new();
        row.insert(COL_ID_ON_CHAIN.to_string(), self.id_on_chain);
        row.insert(COL_CREATOR.to_string(), self.creator);
        row.insert(COL_CREATED_AT.to_string(), self.created_at);
        row.insert(COL_METADATA.to_string(), self.metadata);
        row.insert(
            COL_LINK.to_string(),
            self.link.map(Value::String).unwrap_or(Value::Null),
        );
        row
    }
}

/// Per-asset tags carried by an indexer table and merged into text assets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTags {
    pub category: Value,
    pub kind: Value,
}

impl AssetTags {
    pub fn from_row(row: &Row) -> Self {
        Self {
            category: row.get(COL_CATEGORY).cloned().unwrap_or(Value::Null),
            kind: row.get(COL_TYPE).cloned().unwrap_or(Value::Null),
        }
    }

    /// Overlay the tags onto a row; tags win over existing columns.
    pub fn apply(&self, row: &mut Row) {
        row.insert(COL_CATEGORY.to_string(), self.category.clone());
        row.insert(COL_TYPE.to_string(), self.kind.clone());
    }
}
