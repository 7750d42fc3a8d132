//! Event stores for action records.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::dispatch::ActionRecord;
use crate::error::{HearthError, Result};

/// Durable log of interpreted commands.
pub trait EventStore: Send + Sync {
    fn persist(&self, record: &ActionRecord) -> Result<()>;
}

/// Store kept in memory. Persisting a record with a known id replaces it.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    records: Mutex<Vec<ActionRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn records(&self) -> Vec<ActionRecord> {
        self.records.lock().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<ActionRecord> {
        self.records.lock().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl EventStore for MemoryEventStore {
    fn persist(&self, record: &ActionRecord) -> Result<()> {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }
}

/// Append-only file with one JSON record per line.
///
/// A record persisted again under the same id is appended; readers keep the
/// last line for each id.
#[derive(Debug)]
pub struct JsonLinesEventStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesEventStore {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| store_error(&path, source))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back all records, latest version per id, in first-seen order.
    pub fn load(&self) -> Result<Vec<ActionRecord>> {
        let file = File::open(&self.path).map_err(|source| store_error(&self.path, source))?;
        let mut records: Vec<ActionRecord> = Vec::new();

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| store_error(&self.path, source))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ActionRecord = serde_json::from_str(&line)?;
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        Ok(records)
    }
}

impl EventStore for JsonLinesEventStore {
    fn persist(&self, record: &ActionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock();
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| store_error(&self.path, source))
    }
}

fn store_error(path: &Path, source: std::io::Error) -> HearthError {
    HearthError::EventStoreError {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dispatch::{ActionKind, ActionStatus};

    fn record(target: &str) -> ActionRecord {
        let created_at = NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        ActionRecord::new(
            created_at,
            format!("turn on the {}", target),
            ActionKind::Device,
            target,
            ActionStatus::Done,
        )
    }

    #[test]
    fn test_memory_store_replaces_by_id() {
        let store = MemoryEventStore::new();
        let mut first = record("kitchen fan");
        store.persist(&first).unwrap();
        store.persist(&record("bedroom heater")).unwrap();

        first.status = ActionStatus::Failed;
        store.persist(&first).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(first.id).map(|r| r.status), Some(ActionStatus::Failed));
    }

    #[test]
    fn test_json_lines_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let store = JsonLinesEventStore::open(&path).unwrap();

        let mut first = record("kitchen fan");
        let second = record("bedroom heater");
        store.persist(&first).unwrap();
        store.persist(&second).unwrap();
        first.status = ActionStatus::Failed;
        store.persist(&first).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        JsonLinesEventStore::open(&path)
            .unwrap()
            .persist(&record("kitchen fan"))
            .unwrap();
        let store = JsonLinesEventStore::open(&path).unwrap();
        store.persist(&record("bathroom light")).unwrap();

        assert_eq!(store.load().unwrap().len(), 2);
    }
}
