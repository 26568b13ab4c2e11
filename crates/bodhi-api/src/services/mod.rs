//! Service layer for multi-query operations.

pub mod asset_join;
pub mod classifier;

pub use asset_join::{join_text_assets, merge_tags};
pub use classifier::{classify_pending, BatchSummary};
