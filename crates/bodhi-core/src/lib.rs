//! # bodhi-core
//!
//! Core types, traits, and row shaping for the Bodhi interactor API.
//!
//! This crate holds everything that does not perform I/O: the error type,
//! table and chain constants, the backend-agnostic [`RowQuery`] description,
//! the [`RowStore`] trait implemented by `bodhi-db`, and the pure row
//! transforms applied before rows are returned to callers.

pub mod defaults;
pub mod error;
pub mod markdown;
pub mod models;
pub mod query;
pub mod shaping;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use markdown::{contains_image, extract_image_link};
pub use models::*;
pub use query::{Filter, FilterValue, Order, RowQuery};
pub use shaping::{first_line, shape_row, shape_rows};
pub use traits::RowStore;
