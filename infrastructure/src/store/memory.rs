//! In-memory record store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use switchboard_application::ports::record_store::validate_table;
use switchboard_application::{RecordFilter, RecordStore, StoreError};

type Table = Vec<Map<String, Value>>;

/// Tables held in a mutex-guarded map. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `table`
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(table)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, table: &str, record: Value) -> Result<String, StoreError> {
        validate_table(table)?;
        let Value::Object(mut record) = record else {
            return Err(StoreError::NotAnObject);
        };

        let mut tables = self.tables.lock().unwrap_or_else(|p| p.into_inner());
        let rows = tables.entry(table.to_string()).or_default();
        let id = format!("{}-{}", table, rows.len() + 1);
        record.insert("id".to_string(), Value::String(id.clone()));
        rows.push(record);
        Ok(id)
    }

    async fn select(&self, table: &str, filter: &RecordFilter) -> Result<Vec<Value>, StoreError> {
        validate_table(table)?;
        let tables = self.tables.lock().unwrap_or_else(|p| p.into_inner());
        Ok(tables
            .get(table)
            .map(|rows| filter.apply(rows))
            .unwrap_or_default())
    }
}
