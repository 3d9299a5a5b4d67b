//! Key-value persistence port and its implementations.
//!
//! The engine never touches a global store: it is handed something that
//! implements [`KeyValueStore`] and reads/writes through the typed,
//! corruption-tolerant accessors in [`SugarStoreExt`].

use crate::{CustomItemRecord, DailySugarLog, Error, Result, ThresholdMultipliers};
use chrono::{DateTime, Local};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persisted key names
pub mod keys {
    pub const DAILY_LIMIT: &str = "dailySugarLimit";
    pub const THRESHOLD_L2: &str = "thresholdMultiplierL2";
    pub const THRESHOLD_L3: &str = "thresholdMultiplierL3";
    pub const THRESHOLD_L4: &str = "thresholdMultiplierL4";
    pub const THRESHOLD_L5: &str = "thresholdMultiplierL5";
    pub const DAILY_LOGS: &str = "dailySugarLogs";
    pub const CUSTOM_ITEMS: &str = "customSugarItems";
    pub const RECENT_ITEMS: &str = "recentSugarItems";
    pub const LAST_RESET_DATE: &str = "lastResetDate";

    /// Keys copied from a legacy store when the primary store lacks them
    pub const MIGRATED: [&str; 2] = [DAILY_LIMIT, DAILY_LOGS];
}

/// Date-keyed log history (`yyyy-MM-dd` -> log)
pub type LogHistory = BTreeMap<String, DailySugarLog>;

/// Get/set-by-key persistence capability
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// A failed write that did not block the user action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreWarning {
    pub key: String,
    pub message: String,
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to persist '{}': {}", self.key, self.message)
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

/// Typed accessors for every persisted key
///
/// Readers never fail: missing or malformed data is logged and replaced by
/// the default. Writers return the underlying store error.
pub trait SugarStoreExt: KeyValueStore {
    fn read_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read '{}': {}. Using default.", key, e);
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Malformed value for '{}': {}. Using default.", key, e);
                None
            }
        }
    }

    fn write_typed<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }

    /// Stored daily limit, if present and positive
    fn daily_limit(&self) -> Option<i32> {
        self.read_typed::<i64>(keys::DAILY_LIMIT)
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(i32::MAX as i64) as i32)
    }

    fn set_daily_limit(&mut self, limit: i32) -> Result<()> {
        self.write_typed(keys::DAILY_LIMIT, &limit)
    }

    /// Stored multipliers, each falling back to its default, then normalized
    fn threshold_multipliers(&self) -> ThresholdMultipliers {
        let d = ThresholdMultipliers::DEFAULT;
        ThresholdMultipliers {
            l2: self.read_typed(keys::THRESHOLD_L2).unwrap_or(d.l2),
            l3: self.read_typed(keys::THRESHOLD_L3).unwrap_or(d.l3),
            l4: self.read_typed(keys::THRESHOLD_L4).unwrap_or(d.l4),
            l5: self.read_typed(keys::THRESHOLD_L5).unwrap_or(d.l5),
        }
        .normalized()
    }

    fn set_threshold_multipliers(&mut self, multipliers: ThresholdMultipliers) -> Result<()> {
        self.write_typed(keys::THRESHOLD_L2, &multipliers.l2)?;
        self.write_typed(keys::THRESHOLD_L3, &multipliers.l3)?;
        self.write_typed(keys::THRESHOLD_L4, &multipliers.l4)?;
        self.write_typed(keys::THRESHOLD_L5, &multipliers.l5)
    }

    fn daily_logs(&self) -> LogHistory {
        self.read_typed(keys::DAILY_LOGS).unwrap_or_default()
    }

    fn set_daily_logs(&mut self, logs: &LogHistory) -> Result<()> {
        self.write_typed(keys::DAILY_LOGS, logs)
    }

    /// Create or overwrite one day's record, leaving other days untouched
    fn save_daily_log(&mut self, date_key: &str, log: DailySugarLog) -> Result<()> {
        let mut logs = self.daily_logs();
        logs.insert(date_key.to_string(), log);
        self.set_daily_logs(&logs)
    }

    fn custom_items(&self) -> Vec<CustomItemRecord> {
        self.read_typed(keys::CUSTOM_ITEMS).unwrap_or_default()
    }

    fn set_custom_items(&mut self, items: &[CustomItemRecord]) -> Result<()> {
        self.write_typed(keys::CUSTOM_ITEMS, items)
    }

    fn recent_items(&self) -> Vec<String> {
        self.read_typed(keys::RECENT_ITEMS).unwrap_or_default()
    }

    fn set_recent_items(&mut self, names: &[String]) -> Result<()> {
        self.write_typed(keys::RECENT_ITEMS, names)
    }

    fn last_reset_date(&self) -> Option<DateTime<Local>> {
        self.read_typed(keys::LAST_RESET_DATE)
    }

    fn set_last_reset_date(&mut self, date: DateTime<Local>) -> Result<()> {
        self.write_typed(keys::LAST_RESET_DATE, &date)
    }
}

impl<S: KeyValueStore + ?Sized> SugarStoreExt for S {}

/// Copy legacy keys the primary store does not have yet
///
/// Returns the names of the keys that were copied.
pub fn migrate_legacy<P, L>(primary: &mut P, legacy: &L) -> Result<Vec<String>>
where
    P: KeyValueStore + ?Sized,
    L: KeyValueStore + ?Sized,
{
    let mut migrated = Vec::new();
    for key in keys::MIGRATED {
        let present = match primary.get(key) {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!("Cannot inspect '{}' before migration: {}", key, e);
                continue;
            }
        };
        if present {
            continue;
        }
        match legacy.get(key) {
            Ok(Some(value)) => {
                primary.set(key, value)?;
                tracing::info!("Migrated '{}' from legacy store", key);
                migrated.push(key.to_string());
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read legacy '{}': {}", key, e),
        }
    }
    Ok(migrated)
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store for tests and hosts without disk access
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Single JSON object file holding every key
///
/// Reads take a shared lock. Writes are load-modify-save and atomically
/// replace the file through a locked temp file in the same directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole map; a missing file is an empty map
    fn load_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        if let Err(e) = file.unlock() {
            tracing::warn!("Failed to unlock {:?}: {}", self.path, e);
        }
        read?;

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Store(format!(
                "expected a JSON object in {:?}, found {}",
                self.path,
                type_name(&other)
            ))),
        }
    }

    fn save_map(&self, map: &Map<String, Value>) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Load for modification
    ///
    /// Unparseable contents are replaced rather than blocking writes. I/O
    /// failures abort the write so a transient error cannot wipe the file.
    fn load_for_write(&self) -> Result<Map<String, Value>> {
        match self.load_map() {
            Ok(map) => Ok(map),
            Err(e) if is_corrupt_contents(&e) => {
                tracing::warn!(
                    "Store file {:?} is corrupt ({}); starting from an empty store",
                    self.path,
                    e
                );
                Ok(Map::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// Errors about the file's contents rather than access to it
fn is_corrupt_contents(error: &Error) -> bool {
    matches!(error, Error::Json(_) | Error::Store(_))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = self.load_for_write()?;
        map.insert(key.to_string(), value);
        self.save_map(&map)?;
        tracing::debug!("Saved '{}' to {:?}", key, self.path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut map = self.load_for_write()?;
        if map.remove(key).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SugarItemCategory;
    use chrono::TimeZone;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("store.json"));

        store.set_daily_limit(22).unwrap();
        store
            .set_custom_items(&[CustomItemRecord {
                name: "Boba".into(),
                grams: 38,
                category: SugarItemCategory::Drink,
            }])
            .unwrap();
        store.save_daily_log("2026-03-10", DailySugarLog { grams: 50, count: 2 }).unwrap();

        let reopened = JsonFileStore::new(temp_dir.path().join("store.json"));
        assert_eq!(reopened.daily_limit(), Some(22));
        assert_eq!(reopened.custom_items()[0].name, "Boba");
        assert_eq!(
            reopened.daily_logs().get("2026-03-10"),
            Some(&DailySugarLog { grams: 50, count: 2 })
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("nope.json"));

        assert_eq!(store.get(keys::DAILY_LIMIT).unwrap(), None);
        assert!(store.daily_logs().is_empty());
        assert!(store.recent_items().is_empty());
        assert_eq!(store.last_reset_date(), None);
    }

    #[test]
    fn test_corrupted_file_reads_as_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.get(keys::DAILY_LIMIT).is_err());
        assert_eq!(store.daily_limit(), None);
        assert!(store.custom_items().is_empty());
        assert_eq!(store.threshold_multipliers(), ThresholdMultipliers::DEFAULT);

        // Writes recover the file
        store.set_daily_limit(40).unwrap();
        assert_eq!(store.daily_limit(), Some(40));
    }

    #[test]
    fn test_non_object_file_is_replaced_on_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.get(keys::DAILY_LIMIT), Err(Error::Store(_))));

        store.set_daily_limit(40).unwrap();
        assert_eq!(store.daily_limit(), Some(40));
    }

    #[test]
    fn test_read_failure_aborts_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory at the store path opens but cannot be read
        let path = temp_dir.path().join("store.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), "history").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.get(keys::DAILY_LIMIT), Err(Error::Io(_))));
        assert!(matches!(store.set_daily_limit(40), Err(Error::Io(_))));
        assert!(store.remove(keys::DAILY_LIMIT).is_err());

        assert!(path.is_dir());
        assert_eq!(std::fs::read_to_string(path.join("keep.txt")).unwrap(), "history");
    }

    #[test]
    fn test_only_content_errors_count_as_corruption() {
        let parse_error = serde_json::from_str::<Value>("{ nope").unwrap_err();
        assert!(is_corrupt_contents(&Error::Json(parse_error)));
        assert!(is_corrupt_contents(&Error::Store("not an object".into())));

        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        assert!(!is_corrupt_contents(&Error::Io(io_error)));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("store.json"));
        store.set_recent_items(&["Donut".to_string()]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "store.json")
            .collect();
        assert!(extras.is_empty(), "Found extras: {:?}", extras);
    }

    #[test]
    fn test_malformed_value_falls_back_per_key() {
        let mut store = MemoryStore::new();
        store.set(keys::THRESHOLD_L3, Value::String("lots".into())).unwrap();
        store.set(keys::THRESHOLD_L5, serde_json::json!(6.5)).unwrap();
        store.set(keys::CUSTOM_ITEMS, serde_json::json!({"not": "a list"})).unwrap();
        store.set(keys::DAILY_LIMIT, serde_json::json!(-4)).unwrap();

        assert_eq!(
            store.threshold_multipliers(),
            ThresholdMultipliers::new(1.0, 2.0, 4.0, 6.5)
        );
        assert!(store.custom_items().is_empty());
        assert_eq!(store.daily_limit(), None);
    }

    #[test]
    fn test_multipliers_roundtrip() {
        let mut store = MemoryStore::new();
        store
            .set_threshold_multipliers(ThresholdMultipliers::new(1.0, 2.0, 4.0, 5.0))
            .unwrap();
        assert_eq!(
            store.threshold_multipliers(),
            ThresholdMultipliers::new(1.0, 2.0, 4.0, 5.0)
        );
    }

    #[test]
    fn test_last_reset_date_roundtrip() {
        let mut store = MemoryStore::new();
        let date = Local.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).earliest().unwrap();
        store.set_last_reset_date(date).unwrap();
        assert_eq!(store.last_reset_date(), Some(date));
    }

    #[test]
    fn test_save_daily_log_keeps_other_days() {
        let mut store = MemoryStore::new();
        store.save_daily_log("2026-03-09", DailySugarLog { grams: 10, count: 1 }).unwrap();
        store.save_daily_log("2026-03-10", DailySugarLog { grams: 20, count: 2 }).unwrap();
        store.save_daily_log("2026-03-10", DailySugarLog { grams: 0, count: 0 }).unwrap();

        let logs = store.daily_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs["2026-03-09"].grams, 10);
        assert_eq!(logs["2026-03-10"], DailySugarLog::default());
    }

    #[test]
    fn test_migrate_legacy_only_fills_missing_keys() {
        let mut legacy = MemoryStore::new();
        legacy.set_daily_limit(22).unwrap();
        legacy.save_daily_log("2026-01-01", DailySugarLog { grams: 5, count: 1 }).unwrap();

        let mut primary = MemoryStore::new();
        primary.set_daily_limit(30).unwrap();

        let migrated = migrate_legacy(&mut primary, &legacy).unwrap();
        assert_eq!(migrated, vec![keys::DAILY_LOGS.to_string()]);
        assert_eq!(primary.daily_limit(), Some(30));
        assert_eq!(primary.daily_logs()["2026-01-01"].grams, 5);

        // Second run is a no-op
        assert!(migrate_legacy(&mut primary, &legacy).unwrap().is_empty());
    }
}
