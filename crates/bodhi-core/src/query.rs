//! Backend-agnostic query description.
//!
//! Handlers describe what they need with a [`RowQuery`]; each backend in
//! `bodhi-db` translates it (parameterised SQL, PostgREST query string, or
//! in-memory evaluation). Identifiers are validated by the backends, never
//! here.

use serde_json::Value;
use std::fmt;

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl FilterValue {
    /// JSON form, used by the in-memory backend and for patch payloads.
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Int(i) => Value::from(*i),
            FilterValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(i) => write!(f, "{}", i),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

/// One row predicate. All filters of a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, FilterValue),
    Gte(String, FilterValue),
    Lte(String, FilterValue),
    Lt(String, FilterValue),
    In(String, Vec<FilterValue>),
    NotNull(String),
    /// Full-text match of `keyword` against the column.
    TextSearch(String, String),
}

impl Filter {
    /// Column the predicate applies to.
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::Lt(c, _)
            | Filter::In(c, _)
            | Filter::NotNull(c)
            | Filter::TextSearch(c, _) => c,
        }
    }
}

/// Sort direction for a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Description of a read (or the target of an update) against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub table: String,
    /// Projected columns; `None` selects every column.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RowQuery {
    /// Start a query against `table` selecting every column.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::Eq(column.to_string(), value.into()))
    }

    pub fn gte(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::Gte(column.to_string(), value.into()))
    }

    pub fn lte(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::Lte(column.to_string(), value.into()))
    }

    pub fn lt(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(Filter::Lt(column.to_string(), value.into()))
    }

    pub fn in_list(self, column: &str, values: Vec<FilterValue>) -> Self {
        self.filter(Filter::In(column.to_string(), values))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn text_search(self, column: &str, keyword: &str) -> Self {
        self.filter(Filter::TextSearch(column.to_string(), keyword.to_string()))
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Inclusive row range, as in `range(from, to)` on hosted backends.
    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.offset = Some(from);
        self.limit = Some((to - from + 1).max(0));
        self
    }

    /// Every identifier the query references, for validation by backends.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.table.as_str())
            .chain(self.columns.iter().flatten().map(String::as_str))
            .chain(self.filters.iter().map(Filter::column))
            .chain(self.order.iter().map(|o| o.column.as_str()))
    }
}
