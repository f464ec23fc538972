//! SQL admission control and result types.
//!
//! The only admission rule is a prefix check: after trimming and
//! lower-casing, the query must start with `select`. This is not a parser
//! and accepts `select 1; drop table users`.

use serde::{Deserialize, Serialize};

/// A single result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Why a query was refused before reaching the backend.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// Missing, non-string or empty query.
    #[error("Invalid query")]
    Invalid,
    /// Anything other than a SELECT.
    #[error("Only SELECT queries are allowed for security reasons")]
    NotSelect,
}

/// Check a submitted query against the SELECT-only rule.
///
/// Returns the query unchanged; the backend receives the literal text.
///
/// # Errors
///
/// Returns `AdmissionError::Invalid` for an empty query and
/// `AdmissionError::NotSelect` for anything not starting with `select`.
pub fn admit_query(query: &str) -> Result<&str, AdmissionError> {
    if query.is_empty() {
        return Err(AdmissionError::Invalid);
    }
    if !query.trim().to_lowercase().starts_with("select") {
        return Err(AdmissionError::NotSelect);
    }
    Ok(query)
}

/// Body of a query submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlRequest {
    pub query: String,
}

/// Result relayed by the admin proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub row_count: u64,
}

/// A completed query, as held by the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: u64,
    /// Wall-clock time measured by the client, in milliseconds.
    pub execution_time: f64,
}

impl QueryResult {
    #[must_use]
    pub fn from_response(response: SqlResponse, execution_time_ms: f64) -> Self {
        Self {
            columns: response.columns,
            rows: response.rows,
            row_count: response.row_count,
            execution_time: execution_time_ms,
        }
    }
}
