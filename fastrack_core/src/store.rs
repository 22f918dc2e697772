//! Durable key-value storage for the three persisted records.
//!
//! `FileStore` keeps one JSON document per key in a data directory, with
//! shared locks for reads and atomic temp-file replacement for writes.
//! `MemoryStore` holds the same documents in memory.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The named records the app persists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKey {
    ActiveFast,
    FastingHistory,
    JournalLogs,
}

impl RecordKey {
    pub const ALL: [RecordKey; 3] = [
        RecordKey::ActiveFast,
        RecordKey::FastingHistory,
        RecordKey::JournalLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::ActiveFast => "activeFast",
            RecordKey::FastingHistory => "fastingHistory",
            RecordKey::JournalLogs => "journalLogs",
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get/set/remove of serialized records
///
/// A missing key reads as `None`, never as an error.
pub trait KeyValueStore {
    fn get(&self, key: RecordKey) -> Result<Option<String>>;
    fn set(&mut self, key: RecordKey, value: &str) -> Result<()>;
    fn remove(&mut self, key: RecordKey) -> Result<()>;

    /// Drop a record that failed to parse
    fn discard(&mut self, key: RecordKey) -> Result<()> {
        self.remove(key)
    }

    /// Keep a copy of the record as it is now, before it is rewritten
    /// without entries that could not be loaded
    fn preserve(&mut self, key: RecordKey) -> Result<()>;
}

/// One JSON file per record under a data directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: RecordKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: RecordKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} record at {:?}", key, path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read {} record from {:?}", key, path);
        Ok(Some(contents))
    }

    /// Atomically writes the record by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn set(&mut self, key: RecordKey, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        let path = self.path_for(key);
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} record to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: RecordKey) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed {} record at {:?}", key, path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Renames the file to `<key>.json.corrupt` so it can be recovered by hand
    fn discard(&mut self, key: RecordKey) -> Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        let corrupt_path = path.with_extension("json.corrupt");
        std::fs::rename(&path, &corrupt_path)?;
        tracing::warn!("Moved corrupt {} record to {:?}", key, corrupt_path);
        Ok(())
    }

    /// Copies the file to `<key>.json.corrupt`, leaving the original in place
    fn preserve(&mut self, key: RecordKey) -> Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        let corrupt_path = path.with_extension("json.corrupt");
        std::fs::copy(&path, &corrupt_path)?;
        tracing::warn!("Saved a copy of the {} record to {:?}", key, corrupt_path);
        Ok(())
    }
}

/// In-memory store for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: HashMap<RecordKey, String>,
    preserved: HashMap<RecordKey, String>,
    failing: HashSet<RecordKey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write or removal of `key` fail with an IO error
    pub fn fail_writes_to(&mut self, key: RecordKey) {
        self.failing.insert(key);
    }

    /// Let writes to `key` succeed again
    pub fn heal(&mut self, key: RecordKey) {
        self.failing.remove(&key);
    }

    /// The copy kept by the last `preserve` of `key`
    pub fn preserved(&self, key: RecordKey) -> Option<&str> {
        self.preserved.get(&key).map(String::as_str)
    }

    fn check_writable(&self, key: RecordKey) -> Result<()> {
        if self.failing.contains(&key) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("write to {} refused", key),
            )));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: RecordKey) -> Result<Option<String>> {
        Ok(self.records.get(&key).cloned())
    }

    fn set(&mut self, key: RecordKey, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.records.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: RecordKey) -> Result<()> {
        self.check_writable(key)?;
        self.records.remove(&key);
        Ok(())
    }

    fn preserve(&mut self, key: RecordKey) -> Result<()> {
        if let Some(raw) = self.records.get(&key) {
            self.preserved.insert(key, raw.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(RecordKey::ActiveFast, r#"{"a":1}"#).unwrap();
        assert_eq!(
            store.get(RecordKey::ActiveFast).unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert!(temp_dir.path().join("activeFast.json").exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path().join("not-yet-created"));
        assert!(store.get(RecordKey::FastingHistory).unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(RecordKey::ActiveFast, "{}").unwrap();
        store.remove(RecordKey::ActiveFast).unwrap();
        store.remove(RecordKey::ActiveFast).unwrap();
        assert!(store.get(RecordKey::ActiveFast).unwrap().is_none());
    }

    #[test]
    fn test_atomic_set_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(RecordKey::FastingHistory, "[]").unwrap();
        store.set(RecordKey::FastingHistory, "[1]").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "fastingHistory.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only fastingHistory.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_discard_moves_file_aside() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(RecordKey::JournalLogs, "{ broken").unwrap();
        store.discard(RecordKey::JournalLogs).unwrap();

        assert!(store.get(RecordKey::JournalLogs).unwrap().is_none());
        assert!(temp_dir.path().join("journalLogs.json.corrupt").exists());
    }

    #[test]
    fn test_preserve_copies_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store.set(RecordKey::FastingHistory, "[1]").unwrap();
        store.preserve(RecordKey::FastingHistory).unwrap();
        store.set(RecordKey::FastingHistory, "[]").unwrap();

        let copy =
            std::fs::read_to_string(temp_dir.path().join("fastingHistory.json.corrupt")).unwrap();
        assert_eq!(copy, "[1]");
        assert_eq!(
            store.get(RecordKey::FastingHistory).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let mut store = MemoryStore::new();
        store.set(RecordKey::ActiveFast, "x").unwrap();

        store.fail_writes_to(RecordKey::ActiveFast);
        assert!(store.remove(RecordKey::ActiveFast).is_err());
        assert_eq!(store.get(RecordKey::ActiveFast).unwrap().as_deref(), Some("x"));

        store.heal(RecordKey::ActiveFast);
        store.remove(RecordKey::ActiveFast).unwrap();
        assert!(store.get(RecordKey::ActiveFast).unwrap().is_none());
    }

    #[test]
    fn test_record_key_names() {
        let names: Vec<_> = RecordKey::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["activeFast", "fastingHistory", "journalLogs"]);
    }
}
