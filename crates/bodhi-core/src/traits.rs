//! Backend trait.
//!
//! Every route talks to the relational backend through [`RowStore`], which
//! lets the server run against Postgres, a hosted PostgREST endpoint, or the
//! in-memory store used by tests.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Row;
use crate::query::RowQuery;

/// Row-level access to the Bodhi tables.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Short backend name for logs ("postgres", "postgrest", "memory").
    fn backend_name(&self) -> &'static str;

    /// Run a filtered, ordered, paginated read.
    async fn select(&self, query: &RowQuery) -> Result<Vec<Row>>;

    /// Insert rows and return them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>>;

    /// Apply `patch` to every row matching the query's filters and return the
    /// updated rows. Ordering and pagination of the query are ignored.
    async fn update(&self, query: &RowQuery, patch: Row) -> Result<Vec<Row>>;

    /// Read exactly one row.
    ///
    /// Zero rows is `NotFound`; more than one is `InvalidInput`.
    async fn select_single(&self, query: &RowQuery) -> Result<Row> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(Error::NotFound(format!(
                "no row in {} matches the query",
                query.table
            ))),
            n => Err(Error::InvalidInput(format!(
                "expected a single row from {}, got {}",
                query.table, n
            ))),
        }
    }
}
