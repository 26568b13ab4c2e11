//! In-memory row store.
//!
//! Evaluates [`RowQuery`] descriptions directly over `Vec<Row>` tables. Used
//! by the API integration tests and for running the server without a
//! database (`BODHI_BACKEND=memory`). Tables must be seeded; querying an
//! unknown table fails the way a hosted backend reports a missing relation.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use bodhi_core::defaults::COL_ID;
use bodhi_core::{row_i64, Error, Filter, FilterValue, Result, Row, RowQuery, RowStore};

use crate::identifier::{validate_identifier, validate_query_identifiers, validate_update};

/// Which operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
}

/// [`RowStore`] over in-process tables.
#[derive(Default)]
pub struct MemoryRowStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    failures: Mutex<HashSet<(String, StoreOp)>>,
    calls: AtomicUsize,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with each named table present and empty.
    pub fn with_empty_tables(tables: &[&str]) -> Self {
        let store = Self::new();
        for table in tables {
            store.seed(table, Vec::new());
        }
        store
    }

    /// Create (or replace) a table with the given rows.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.lock_tables().insert(table.to_string(), rows);
    }

    /// Snapshot of a table's rows (empty if the table does not exist).
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock_tables().get(table).cloned().unwrap_or_default()
    }

    /// Make every `op` against `table` fail with a backend error.
    pub fn fail_on(&self, table: &str, op: StoreOp) {
        self.lock_failures().insert((table.to_string(), op));
    }

    /// Number of backend calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn lock_tables(&self) -> MutexGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failures(&self) -> MutexGuard<'_, HashSet<(String, StoreOp)>> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, table: &str, op: StoreOp) -> Result<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        trace!(subsystem = "db", component = "memory", op = ?op, db_table = %table, "Store call");
        if self.lock_failures().contains(&(table.to_string(), op)) {
            return Err(Error::Backend {
                status: 500,
                message: format!("injected {:?} failure on {}", op, table),
            });
        }
        Ok(())
    }
}

fn missing_table(table: &str) -> Error {
    Error::Backend {
        status: 404,
        message: format!("relation \"{}\" does not exist", table),
    }
}

/// Order a stored value against a filter literal. Numbers compare
/// numerically (numeric strings included), text compares lexically, and
/// anything else is incomparable.
fn compare(value: &Value, literal: &FilterValue) -> Option<Ordering> {
    match (value, literal) {
        (Value::Number(n), FilterValue::Int(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), FilterValue::Text(s)) => n.as_f64()?.partial_cmp(&s.parse::<f64>().ok()?),
        (Value::String(s), FilterValue::Int(i)) => s.parse::<f64>().ok()?.partial_cmp(&(*i as f64)),
        (Value::String(s), FilterValue::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Bool(b), FilterValue::Text(t)) => Some(b.to_string().as_str().cmp(t.as_str())),
        _ => None,
    }
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let value = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, v) => compare(value, v) == Some(Ordering::Equal),
        Filter::Gte(_, v) => matches!(compare(value, v), Some(Ordering::Greater | Ordering::Equal)),
        Filter::Lte(_, v) => matches!(compare(value, v), Some(Ordering::Less | Ordering::Equal)),
        Filter::Lt(_, v) => compare(value, v) == Some(Ordering::Less),
        Filter::In(_, values) => values
            .iter()
            .any(|v| compare(value, v) == Some(Ordering::Equal)),
        Filter::NotNull(_) => !value.is_null(),
        Filter::TextSearch(_, keyword) => match value.as_str() {
            Some(text) => {
                let text = text.to_lowercase();
                let mut terms = keyword.split_whitespace().peekable();
                terms.peek().is_some() && terms.all(|t| text.contains(&t.to_lowercase()))
            }
            None => false,
        },
    }
}

/// Total order used for `ORDER BY`; nulls sort last ascending.
fn order_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn project(row: &Row, columns: &Option<Vec<String>>) -> Row {
    match columns {
        None => row.clone(),
        Some(cols) => cols
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
            .collect(),
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, query: &RowQuery) -> Result<Vec<Row>> {
        validate_query_identifiers(query)?;
        self.begin(&query.table, StoreOp::Select)?;

        let tables = self.lock_tables();
        let table = tables
            .get(&query.table)
            .ok_or_else(|| missing_table(&query.table))?;

        let mut rows: Vec<&Row> = table
            .iter()
            .filter(|r| query.filters.iter().all(|f| matches(r, f)))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let av = a.get(&order.column).unwrap_or(&Value::Null);
                let bv = b.get(&order.column).unwrap_or(&Value::Null);
                let ord = order_values(av, bv);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|r| project(r, &query.columns))
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        validate_identifier(table)?;
        self.begin(table, StoreOp::Insert)?;

        let mut tables = self.lock_tables();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        let mut next_id = stored.iter().filter_map(|r| row_i64(r, COL_ID)).max().unwrap_or(0) + 1;
        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            if !row.contains_key(COL_ID) {
                row.insert(COL_ID.to_string(), Value::from(next_id));
                next_id += 1;
            }
            stored.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update(&self, query: &RowQuery, patch: Row) -> Result<Vec<Row>> {
        validate_update(query, &patch)?;
        self.begin(&query.table, StoreOp::Update)?;

        let mut tables = self.lock_tables();
        let stored = tables
            .get_mut(&query.table)
            .ok_or_else(|| missing_table(&query.table))?;

        let mut updated = Vec::new();
        for row in stored
            .iter_mut()
            .filter(|r| query.filters.iter().all(|f| matches(r, f)))
        {
            for (k, v) in &patch {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }
}
