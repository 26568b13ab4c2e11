//! Direct Postgres backend.
//!
//! Rows are returned as `to_jsonb(t)` so every table, including the
//! per-space indexer tables whose layout is not known at compile time, can be
//! read without a typed model. Identifiers are validated and double-quoted;
//! every value is bound.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row as _};
use tracing::debug;

use bodhi_core::{Error, Filter, FilterValue, Result, Row, RowQuery, RowStore};

use crate::identifier::{quote_identifier, validate_query_identifiers, validate_update};

/// [`RowStore`] over a sqlx Postgres pool.
#[derive(Clone)]
pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, mut qb: QueryBuilder<'static, Postgres>) -> Result<Vec<Row>> {
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let value: Value = row.try_get("row")?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Serialization(format!(
            "expected a JSON object row, got {}",
            other
        ))),
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Int(i) => qb.push_bind(*i),
        FilterValue::Text(s) => qb.push_bind(s.clone()),
    };
}

fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        let column = format!("t.{}", quote_identifier(filter.column()));
        match filter {
            Filter::Eq(_, v) => {
                qb.push(column).push(" = ");
                push_value(qb, v);
            }
            Filter::Gte(_, v) => {
                qb.push(column).push(" >= ");
                push_value(qb, v);
            }
            Filter::Lte(_, v) => {
                qb.push(column).push(" <= ");
                push_value(qb, v);
            }
            Filter::Lt(_, v) => {
                qb.push(column).push(" < ");
                push_value(qb, v);
            }
            Filter::In(_, values) => {
                let ints: Option<Vec<i64>> = values
                    .iter()
                    .map(|v| match v {
                        FilterValue::Int(i) => Some(*i),
                        FilterValue::Text(_) => None,
                    })
                    .collect();
                match ints {
                    Some(ints) => {
                        qb.push(column).push(" = ANY(").push_bind(ints).push(")");
                    }
                    None => {
                        let texts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                        qb.push(column)
                            .push("::text = ANY(")
                            .push_bind(texts)
                            .push(")");
                    }
                }
            }
            Filter::NotNull(_) => {
                qb.push(column).push(" IS NOT NULL");
            }
            Filter::TextSearch(_, keyword) => {
                qb.push(column)
                    .push(" @@ to_tsquery(")
                    .push_bind(keyword.clone())
                    .push(")");
            }
        }
    }
}

/// Render a read as parameterised SQL.
pub(crate) fn build_select(query: &RowQuery) -> Result<QueryBuilder<'static, Postgres>> {
    validate_query_identifiers(query)?;

    let mut qb = QueryBuilder::new("SELECT ");
    match &query.columns {
        None => {
            qb.push("to_jsonb(t)");
        }
        Some(columns) => {
            qb.push("jsonb_build_object(");
            for (i, c) in columns.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(format!("'{}', t.{}", c, quote_identifier(c)));
            }
            qb.push(")");
        }
    }
    qb.push(" AS row FROM ")
        .push(quote_identifier(&query.table))
        .push(" AS t");

    push_filters(&mut qb, &query.filters);

    if let Some(order) = &query.order {
        qb.push(" ORDER BY t.")
            .push(quote_identifier(&order.column))
            .push(if order.ascending { " ASC" } else { " DESC" });
    }
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = query.offset {
        qb.push(" OFFSET ").push_bind(offset);
    }
    Ok(qb)
}

/// Render a single-row insert. Only the columns present in `row` are
/// written, so serial ids and column defaults still apply.
pub(crate) fn build_insert(table: &str, row: Row) -> Result<QueryBuilder<'static, Postgres>> {
    crate::identifier::validate_identifier(table)?;
    if row.is_empty() {
        return Err(Error::InvalidInput(format!("empty insert into {}", table)));
    }
    row.keys()
        .try_for_each(|k| crate::identifier::validate_identifier(k))?;

    let table_ident = quote_identifier(table);
    let columns: Vec<String> = row.keys().map(|k| quote_identifier(k)).collect();

    let mut qb = QueryBuilder::new("INSERT INTO ");
    qb.push(&table_ident)
        .push(" AS t (")
        .push(columns.join(", "))
        .push(") SELECT ")
        .push(
            columns
                .iter()
                .map(|c| format!("r.{}", c))
                .collect::<Vec<_>>()
                .join(", "),
        )
        .push(" FROM jsonb_populate_record(NULL::")
        .push(&table_ident)
        .push(", ")
        .push_bind(Value::Object(row))
        .push(") AS r RETURNING to_jsonb(t) AS row");
    Ok(qb)
}

/// Render a filtered update of the columns present in `patch`.
pub(crate) fn build_update(query: &RowQuery, patch: Row) -> Result<QueryBuilder<'static, Postgres>> {
    validate_update(query, &patch)?;

    let table_ident = quote_identifier(&query.table);
    let assignments: Vec<String> = patch
        .keys()
        .map(|k| format!("{0} = r.{0}", quote_identifier(k)))
        .collect();

    let mut qb = QueryBuilder::new("UPDATE ");
    qb.push(&table_ident)
        .push(" AS t SET ")
        .push(assignments.join(", "))
        .push(" FROM jsonb_populate_record(NULL::")
        .push(&table_ident)
        .push(", ")
        .push_bind(Value::Object(patch))
        .push(") AS r");
    push_filters(&mut qb, &query.filters);
    qb.push(" RETURNING to_jsonb(t) AS row");
    Ok(qb)
}

#[async_trait]
impl RowStore for PgRowStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn select(&self, query: &RowQuery) -> Result<Vec<Row>> {
        let start = Instant::now();
        let rows = self.fetch_rows(build_select(query)?).await?;
        debug!(
            subsystem = "db",
            component = "postgres",
            op = "select",
            db_table = %query.table,
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Select complete"
        );
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        let mut inserted = Vec::with_capacity(rows.len());
        let mut tx = self.pool.begin().await?;
        for row in rows {
            let mut qb = build_insert(table, row)?;
            let returned = qb.build().fetch_all(&mut *tx).await?;
            for r in &returned {
                inserted.push(decode_row(r)?);
            }
        }
        tx.commit().await?;
        debug!(
            subsystem = "db",
            component = "postgres",
            op = "insert",
            db_table = %table,
            result_count = inserted.len(),
            "Insert complete"
        );
        Ok(inserted)
    }

    async fn update(&self, query: &RowQuery, patch: Row) -> Result<Vec<Row>> {
        let rows = self.fetch_rows(build_update(query, patch)?).await?;
        debug!(
            subsystem = "db",
            component = "postgres",
            op = "update",
            db_table = %query.table,
            result_count = rows.len(),
            "Update complete"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_range_sql() {
        let q = RowQuery::table("bodhi_text_assets")
            .gte("id_on_chain", 1)
            .lte("id_on_chain", 9)
            .order_by("id_on_chain", true);
        let qb = build_select(&q).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT to_jsonb(t) AS row FROM \"bodhi_text_assets\" AS t \
             WHERE t.\"id_on_chain\" >= $1 AND t.\"id_on_chain\" <= $2 \
             ORDER BY t.\"id_on_chain\" ASC"
        );
    }

    #[test]
    fn test_select_projection_limit_offset_sql() {
        let q = RowQuery::table("bodhi_img_assets_k_v")
            .columns(&["id"])
            .order_by("id", false)
            .range(10, 19);
        let qb = build_select(&q).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT jsonb_build_object('id', t.\"id\") AS row FROM \"bodhi_img_assets_k_v\" AS t \
             ORDER BY t.\"id\" DESC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_select_in_and_fts_sql() {
        let q = RowQuery::table("bodhi_text_assets")
            .in_list("id_on_chain", vec![1.into(), 2.into()])
            .text_search("content", "bodhi")
            .not_null("creator");
        let sql = build_select(&q).unwrap().sql().to_string();
        assert!(sql.contains("t.\"id_on_chain\" = ANY($1)"));
        assert!(sql.contains("t.\"content\" @@ to_tsquery($2)"));
        assert!(sql.ends_with("t.\"creator\" IS NOT NULL"));
    }

    #[test]
    fn test_select_mixed_in_list_compares_as_text() {
        let q = RowQuery::table("t").in_list("id_on_chain", vec![1.into(), "x".into()]);
        let sql = build_select(&q).unwrap().sql().to_string();
        assert!(sql.contains("t.\"id_on_chain\"::text = ANY($1)"));
    }

    #[test]
    fn test_select_rejects_bad_table() {
        let q = RowQuery::table("bodhi_spaces; DROP TABLE x");
        assert!(matches!(build_select(&q), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_insert_sql_lists_only_given_columns() {
        let row = json!({"id_on_chain": 5, "link": "https://x"})
            .as_object()
            .cloned()
            .unwrap();
        let qb = build_insert("bodhi_img_assets_k_v", row).unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO \"bodhi_img_assets_k_v\" AS t (\"id_on_chain\", \"link\") \
             SELECT r.\"id_on_chain\", r.\"link\" FROM jsonb_populate_record(NULL::\"bodhi_img_assets_k_v\", $1) AS r \
             RETURNING to_jsonb(t) AS row"
        );
    }

    #[test]
    fn test_update_sql() {
        let patch = json!({"if_to_img_assets": 2}).as_object().cloned().unwrap();
        let q = RowQuery::table("bodhi_text_assets_k_v").eq("id", 77);
        let qb = build_update(&q, patch).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE \"bodhi_text_assets_k_v\" AS t SET \"if_to_img_assets\" = r.\"if_to_img_assets\" \
             FROM jsonb_populate_record(NULL::\"bodhi_text_assets_k_v\", $1) AS r \
             WHERE t.\"id\" = $2 RETURNING to_jsonb(t) AS row"
        );
    }

    #[test]
    fn test_update_without_filter_is_rejected() {
        let patch = json!({"category": "x"}).as_object().cloned().unwrap();
        let q = RowQuery::table("bodhi_img_assets_k_v");
        assert!(build_update(&q, patch).is_err());
    }
}
