//! SQL query models.
//!
//! Contains models for ad-hoc SQL execution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for `POST /api/query`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// SQL text, sent to the driver unmodified.
    #[serde(default)]
    #[validate(custom(
        function = "crate::utils::validate_not_blank",
        message = "Query cannot be empty"
    ))]
    pub query: String,
}

/// Result of an ad-hoc query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Rows as field-name to value mappings, in column order.
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
    /// Number of rows returned, or rows affected for statements without rows.
    pub row_count: u64,
    /// Field names of the result set.
    pub fields: Vec<String>,
}

impl QueryResult {
    /// Builds a result from fetched rows.
    ///
    /// `fields` come from the first row; `rowCount` is the number of rows when
    /// any were returned, otherwise the driver's affected-row count.
    pub fn from_rows(rows: Vec<Map<String, Value>>, rows_affected: u64) -> Self {
        let fields = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let row_count = if rows.is_empty() {
            rows_affected
        } else {
            rows.len() as u64
        };
        Self {
            rows,
            row_count,
            fields,
        }
    }
}
