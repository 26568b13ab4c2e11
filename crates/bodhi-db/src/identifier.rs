//! Table and column name validation.
//!
//! Table names reach the backend from query parameters (`table_name`,
//! `space_addr`), so every identifier is checked before it is quoted into SQL
//! or placed in a PostgREST path.

use bodhi_core::{Error, Result, Row, RowQuery};

/// PostgreSQL identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Validate a table or column name.
///
/// Identifiers must:
/// - Not be empty
/// - Not exceed 63 characters (PostgreSQL identifier limit)
/// - Contain only ASCII alphanumeric characters and underscores
/// - Not name a system catalog (`pg_*`, `information_schema`)
///
/// Leading digits are accepted: space indexer tables are named after
/// `0x…` contract addresses and are always double-quoted.
///
/// # Examples
///
/// ```
/// use bodhi_db::validate_identifier;
///
/// assert!(validate_identifier("bodhi_text_assets").is_ok());
/// assert!(validate_identifier("0x2ad82a4e39bac43a54ddfe6f94980aaf0d1409ef_indexer").is_ok());
/// assert!(validate_identifier("pg_authid").is_err());
/// assert!(validate_identifier("").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidInput(format!(
            "Identifier exceeds 63 character limit: {} characters",
            name.len()
        )));
    }

    if let Some(ch) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(Error::InvalidInput(format!(
            "Identifier contains invalid character: '{}'. Only alphanumeric and underscore allowed",
            ch
        )));
    }

    let lowercase = name.to_ascii_lowercase();
    if lowercase.starts_with("pg_") || lowercase == "information_schema" {
        return Err(Error::InvalidInput(format!(
            "Identifier '{}' refers to a system catalog",
            name
        )));
    }

    Ok(())
}

/// Validate every identifier a query references.
pub fn validate_query_identifiers(query: &RowQuery) -> Result<()> {
    query.identifiers().try_for_each(validate_identifier)
}

/// Validate the target of an update.
///
/// Updates must be filtered and must change at least one column; an
/// unfiltered update would rewrite the whole table.
pub fn validate_update(query: &RowQuery, patch: &Row) -> Result<()> {
    validate_query_identifiers(query)?;
    if query.filters.is_empty() {
        return Err(Error::InvalidInput(format!(
            "refusing unfiltered update of {}",
            query.table
        )));
    }
    if patch.is_empty() {
        return Err(Error::InvalidInput("update patch is empty".to_string()));
    }
    patch.keys().try_for_each(|k| validate_identifier(k))
}

/// Double-quote a validated identifier for SQL.
///
/// Callers must validate first; validated identifiers never contain quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}
