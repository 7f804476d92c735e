//! Record store port
//!
//! Generic table-oriented persistence. Records are JSON objects; the store
//! assigns each one a string id.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur in a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Record must be a JSON object")]
    NotAnObject,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt record in {table}: {message}")]
    Corrupt { table: String, message: String },
}

/// Field-equality filter with an optional row limit.
///
/// An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub equals: Vec<(String, Value)>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((name.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.equals
            .iter()
            .all(|(name, expected)| record.get(name) == Some(expected))
    }

    /// Apply the filter to records in insertion order.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Map<String, Value>>) -> Vec<Value> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|record| Value::Object(record.clone()))
            .collect()
    }
}

/// Opaque async record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert `record` into `table` and return its id
    async fn insert(&self, table: &str, record: Value) -> Result<String, StoreError>;

    /// Records of `table` matching `filter`, in insertion order
    async fn select(&self, table: &str, filter: &RecordFilter) -> Result<Vec<Value>, StoreError>;
}

/// Reject table names that could escape a storage directory.
pub fn validate_table(table: &str) -> Result<(), StoreError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn filter_matches_all_fields() {
        let rows = vec![
            object(json!({"conversation": "a", "role": "user"})),
            object(json!({"conversation": "b", "role": "user"})),
            object(json!({"conversation": "a", "role": "assistant"})),
        ];
        let filter = RecordFilter::new().field("conversation", "a");
        assert_eq!(filter.apply(&rows).len(), 2);

        let filter = RecordFilter::new()
            .field("conversation", "a")
            .field("role", "assistant");
        assert_eq!(filter.apply(&rows).len(), 1);

        assert_eq!(RecordFilter::new().limit(1).apply(&rows).len(), 1);
    }

    #[test]
    fn table_names() {
        assert!(validate_table("chat_messages").is_ok());
        assert!(validate_table("").is_err());
        assert!(validate_table("../etc").is_err());
    }
}
