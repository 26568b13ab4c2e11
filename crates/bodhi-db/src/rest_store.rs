//! Hosted PostgREST backend.
//!
//! Talks to `{url}/rest/v1/{table}` with the service-role key, translating a
//! [`RowQuery`] into PostgREST's operator syntax (`col=eq.v`, `order=col.desc`,
//! …). One `reqwest::Client` is built at startup and reused.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use bodhi_core::{Error, Filter, FilterValue, Result, Row, RowQuery, RowStore};

use crate::identifier::{validate_identifier, validate_query_identifiers, validate_update};

/// Default request timeout for backend calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Service-role key, sent as `apikey` and bearer token.
    pub service_key: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// [`RowStore`] backed by PostgREST.
#[derive(Clone)]
pub struct RestRowStore {
    client: Client,
    config: RestConfig,
}

impl RestRowStore {
    pub fn new(config: RestConfig) -> Result<Self> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "backend URL must start with http:// or https://, got: {}",
                config.base_url
            )));
        }
        if config.service_key.is_empty() {
            return Err(Error::Config("backend service key cannot be empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn send(&self, op: &'static str, table: &str, req: RequestBuilder) -> Result<Vec<Row>> {
        let start = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(
                subsystem = "db",
                component = "postgrest",
                op,
                db_table = %table,
                status = status.as_u16(),
                error = %message,
                "Backend request failed"
            );
            return Err(Error::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp.json().await?;
        let rows = rows_from_body(body)?;
        debug!(
            subsystem = "db",
            component = "postgrest",
            op,
            db_table = %table,
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Backend request complete"
        );
        Ok(rows)
    }
}

fn rows_from_body(body: Value) -> Result<Vec<Row>> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(Error::Serialization(format!(
                    "expected a JSON object row, got {}",
                    other
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::Serialization(format!(
            "expected a JSON array of rows, got {}",
            other
        ))),
    }
}

/// Quote a value for use inside an `in.(…)` list.
fn in_list_item(value: &FilterValue) -> String {
    match value {
        FilterValue::Int(i) => i.to_string(),
        FilterValue::Text(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    let column = filter.column().to_string();
    let value = match filter {
        Filter::Eq(_, v) => format!("eq.{}", v),
        Filter::Gte(_, v) => format!("gte.{}", v),
        Filter::Lte(_, v) => format!("lte.{}", v),
        Filter::Lt(_, v) => format!("lt.{}", v),
        Filter::In(_, values) => format!(
            "in.({})",
            values.iter().map(in_list_item).collect::<Vec<_>>().join(",")
        ),
        Filter::NotNull(_) => "not.is.null".to_string(),
        Filter::TextSearch(_, keyword) => format!("fts.{}", keyword),
    };
    (column, value)
}

/// Render the filter-only part of a query (used by updates).
fn filter_params(query: &RowQuery) -> Vec<(String, String)> {
    query.filters.iter().map(filter_param).collect()
}

/// Render a read as PostgREST query parameters.
pub(crate) fn select_params(query: &RowQuery) -> Vec<(String, String)> {
    let select = query
        .columns
        .as_ref()
        .map(|c| c.join(","))
        .unwrap_or_else(|| "*".to_string());

    let mut params = vec![("select".to_string(), select)];
    params.extend(filter_params(query));
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    if let Some(offset) = query.offset {
        params.push(("offset".to_string(), offset.to_string()));
    }
    params
}

#[async_trait]
impl RowStore for RestRowStore {
    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    async fn select(&self, query: &RowQuery) -> Result<Vec<Row>> {
        validate_query_identifiers(query)?;
        let req = self
            .request(Method::GET, &query.table)
            .query(&select_params(query));
        self.send("select", &query.table, req).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        validate_identifier(table)?;
        let body = Value::Array(rows.into_iter().map(Value::Object).collect());
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&body);
        self.send("insert", table, req).await
    }

    async fn update(&self, query: &RowQuery, patch: Row) -> Result<Vec<Row>> {
        validate_update(query, &patch)?;
        let req = self
            .request(Method::PATCH, &query.table)
            .header("Prefer", "return=representation")
            .query(&filter_params(query))
            .json(&Value::Object(patch));
        self.send("update", &query.table, req).await
    }
}
