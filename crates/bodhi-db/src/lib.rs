//! # bodhi-db
//!
//! Backends for the Bodhi tables.
//!
//! This crate provides:
//! - [`PgRowStore`]: direct Postgres access through a sqlx pool
//! - [`RestRowStore`]: a hosted PostgREST endpoint (service-role key)
//! - [`MemoryRowStore`]: an in-process store for tests and local runs
//! - Connection pool management and identifier validation
//!
//! All three implement [`bodhi_core::RowStore`] and accept the same
//! [`bodhi_core::RowQuery`] descriptions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bodhi_db::{create_pool, PgRowStore};
//! use bodhi_core::{RowQuery, RowStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PgRowStore::new(create_pool("postgres://localhost/bodhi").await?);
//!     let spaces = store
//!         .select(&RowQuery::table("bodhi_spaces").not_null("name"))
//!         .await?;
//!     println!("{} spaces", spaces.len());
//!     Ok(())
//! }
//! ```
pub mod identifier;
pub mod memory;
pub mod pg_store;
pub mod pool;
pub mod rest_store;

// Re-export core types
pub use bodhi_core::*;

pub use identifier::{
    quote_identifier, validate_identifier, validate_query_identifiers, validate_update,
};
pub use memory::{MemoryRowStore, StoreOp};
pub use pg_store::PgRowStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use rest_store::{RestConfig, RestRowStore};
