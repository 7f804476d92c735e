//! JSONL directory record store.
//!
//! Each table is a `<table>.jsonl` file under the store directory. Inserts
//! append one JSON object per line; selects read the file back in order.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use switchboard_application::ports::record_store::validate_table;
use switchboard_application::{RecordFilter, RecordStore, StoreError};
use tracing::debug;

/// Append-only JSONL tables in one directory.
///
/// Writes are serialized through a mutex that also caches each table's
/// record count for id assignment.
pub struct JsonlRecordStore {
    dir: PathBuf,
    counts: Mutex<HashMap<String, usize>>,
}

impl JsonlRecordStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            StoreError::Io(format!("could not create {}: {}", dir.display(), e))
        })?;
        debug!(dir = %dir.display(), "Opened JSONL record store");
        Ok(Self {
            dir: dir.to_path_buf(),
            counts: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", table))
    }

    fn read_table(&self, table: &str) -> Result<Vec<Map<String, Value>>, StoreError> {
        let path = self.table_path(table);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        };

        let mut rows = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;
            if line.trim().is_empty() {
                continue;
            }
            let corrupt = |message: String| StoreError::Corrupt {
                table: table.to_string(),
                message: format!("line {}: {}", number + 1, message),
            };
            match serde_json::from_str::<Value>(&line).map_err(|e| corrupt(e.to_string()))? {
                Value::Object(map) => rows.push(map),
                _ => return Err(corrupt("not a JSON object".to_string())),
            }
        }
        Ok(rows)
    }

    fn append(&self, table: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.table_path(table);
        let io = |e: std::io::Error| StoreError::Io(format!("{}: {}", path.display(), e));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io)?;
        let line = serde_json::to_string(record).map_err(|e| StoreError::Io(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", line).map_err(io)?;
        writer.flush().map_err(io)
    }
}

#[async_trait]
impl RecordStore for JsonlRecordStore {
    async fn insert(&self, table: &str, record: Value) -> Result<String, StoreError> {
        validate_table(table)?;
        let Value::Object(mut record) = record else {
            return Err(StoreError::NotAnObject);
        };

        let mut counts = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        let count = match counts.get(table) {
            Some(count) => *count,
            None => self.read_table(table)?.len(),
        };

        let id = format!("{}-{}", table, count + 1);
        record.insert("id".to_string(), Value::String(id.clone()));
        self.append(table, &Value::Object(record))?;
        counts.insert(table.to_string(), count + 1);
        Ok(id)
    }

    async fn select(&self, table: &str, filter: &RecordFilter) -> Result<Vec<Value>, StoreError> {
        validate_table(table)?;
        // Hold the lock so a concurrent append is never read half-written
        let _guard = self.counts.lock().unwrap_or_else(|p| p.into_inner());
        let rows = self.read_table(table)?;
        Ok(filter.apply(&rows))
    }
}
