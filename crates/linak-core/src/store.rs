//! Settings storage.
//!
//! [`ConfigStore`] is a string-keyed mapping of JSON values. Every mutation
//! reads the whole document, changes it and writes it back; there is no
//! locking, so two processes writing at once can lose an update.
//!
//! [`JsonFileStore`] keeps the document on disk and [`MemoryStore`] keeps it
//! in memory. [`DeskSettings`] layers typed accessors for the desk's keys on
//! top of either.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::debug;

use linak_types::{Calibration, Millimeters};

use crate::error::{Error, Result, Setting};

/// Keys used in the settings document.
pub mod keys {
    /// The desk's Bluetooth identity.
    pub const DEVICE_ID: &str = "device_id";
    /// The desk's lowest height in millimeters.
    pub const LOWEST_POS_MM: &str = "lowest_pos_mm";
    /// Saved presets, an object of name to height.
    pub const POSITIONS: &str = "positions";
}

/// A string-keyed mapping of JSON values.
pub trait ConfigStore: Send + Sync {
    /// Get a value.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Get a value, falling back to `default`.
    fn get_or(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Set a value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Get the whole document.
    fn get_all(&self) -> Result<Map<String, Value>>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        (**self).get_all()
    }
}

/// Settings document stored as a JSON file.
///
/// The file and its parent directory are created, holding `{}`, the first
/// time the store is accessed. Every call re-reads the file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            debug!("Creating settings file {}", self.path.display());
            self.save(&Map::new())?;
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::invalid_config(format!(
                "{} must contain a JSON object, found {}",
                self.path.display(),
                json_type(&other)
            ))),
        }
    }

    fn save(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut document = self.load()?;
        document.insert(key.to_string(), value);
        self.save(&document)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut document = self.load()?;
        if document.remove(key).is_some() {
            self.save(&document)?;
        }
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        self.load()
    }
}

/// In-memory settings document.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `document`.
    pub fn with_document(document: Map<String, Value>) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    fn document(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.document().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.document().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.document().remove(key);
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        Ok(self.document().clone())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Typed access to the desk's settings.
#[derive(Debug)]
pub struct DeskSettings<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ConfigStore + ?Sized> DeskSettings<'a, S> {
    /// Wrap a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The stored desk identity. An empty string counts as unset.
    pub fn device_id(&self) -> Result<Option<String>> {
        match self.store.get(keys::DEVICE_ID)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(id)) => {
                let id = id.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Some(other) => Err(Error::invalid_config(format!(
                "{} must be a string, found {}",
                keys::DEVICE_ID,
                json_type(&other)
            ))),
        }
    }

    /// Store the desk identity.
    pub fn set_device_id(&self, device_id: &str) -> Result<()> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(Error::invalid_config("device_id can not be empty"));
        }
        self.store
            .set(keys::DEVICE_ID, Value::String(device_id.to_string()))
    }

    /// The stored lowest height.
    ///
    /// Accepts a JSON integer or a string holding one.
    pub fn lowest_pos_mm(&self) -> Result<Option<Millimeters>> {
        let value = match self.store.get(keys::LOWEST_POS_MM)? {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let parsed = match &value {
            Value::Number(n) => n.as_i64().and_then(|n| Millimeters::try_from(n).ok()),
            Value::String(s) if s.trim().is_empty() => return Ok(None),
            Value::String(s) => s.trim().parse::<Millimeters>().ok(),
            _ => None,
        };

        parsed.map(Some).ok_or_else(|| {
            Error::invalid_config(format!(
                "{} must be an integer number of millimeters, found {}",
                keys::LOWEST_POS_MM,
                value
            ))
        })
    }

    /// Store the lowest height.
    pub fn set_lowest_pos_mm(&self, lowest_pos_mm: Millimeters) -> Result<()> {
        self.store
            .set(keys::LOWEST_POS_MM, Value::from(lowest_pos_mm))
    }

    /// The stored calibration, if the lowest height is set.
    pub fn calibration(&self) -> Result<Option<Calibration>> {
        Ok(self.lowest_pos_mm()?.map(Calibration::new))
    }

    /// Get the identity and calibration needed for a position read.
    ///
    /// Reports every missing setting at once.
    pub fn require(&self) -> Result<(String, Calibration)> {
        let device_id = self.device_id()?;
        let calibration = self.calibration()?;

        match (device_id, calibration) {
            (Some(id), Some(cal)) => Ok((id, cal)),
            (id, cal) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push(Setting::DeviceId);
                }
                if cal.is_none() {
                    missing.push(Setting::LowestPosMm);
                }
                Err(Error::not_configured(missing))
            }
        }
    }

    /// The saved presets, by name.
    pub fn positions(&self) -> Result<BTreeMap<String, Millimeters>> {
        let value = self
            .store
            .get_or(keys::POSITIONS, Value::Object(Map::new()))?;

        let entries = match value {
            Value::Object(entries) => entries,
            other => {
                return Err(Error::invalid_config(format!(
                    "{} must be an object, found {}",
                    keys::POSITIONS,
                    json_type(&other)
                )));
            }
        };

        entries
            .into_iter()
            .map(|(name, height)| {
                height
                    .as_i64()
                    .and_then(|h| Millimeters::try_from(h).ok())
                    .map(|h| (name.clone(), h))
                    .ok_or_else(|| {
                        Error::invalid_config(format!(
                            "position \"{}\" has invalid height {}",
                            name, height
                        ))
                    })
            })
            .collect()
    }

    /// Replace the saved presets.
    pub fn set_positions(&self, positions: &BTreeMap<String, Millimeters>) -> Result<()> {
        let entries: Map<String, Value> = positions
            .iter()
            .map(|(name, height)| (name.clone(), Value::from(*height)))
            .collect();
        self.store.set(keys::POSITIONS, Value::Object(entries))
    }

    /// The whole settings document.
    pub fn snapshot(&self) -> Result<Map<String, Value>> {
        self.store.get_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_store_creates_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("linak_desk.json");
        let store = JsonFileStore::new(&path);

        assert_eq!(store.get_all().unwrap(), Map::new());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linak_desk.json");

        let store = JsonFileStore::new(&path);
        store.set("device_id", json!("E1:AA:BB:CC:DD:EE")).unwrap();
        store.set("lowest_pos_mm", json!(620)).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get("device_id").unwrap(),
            Some(json!("E1:AA:BB:CC:DD:EE"))
        );
        assert_eq!(reopened.get_or("missing", json!(0)).unwrap(), json!(0));

        reopened.delete("device_id").unwrap();
        reopened.delete("device_id").unwrap();
        assert_eq!(store.get("device_id").unwrap(), None);
        assert_eq!(store.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linak_desk.json");
        fs::write(&path, "[1, 2]").unwrap();

        let err = JsonFileStore::new(&path).get_all().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_file_store_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linak_desk.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).get("device_id").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_lowest_pos_accepts_number_and_string() {
        let store = MemoryStore::new();
        let settings = DeskSettings::new(&store);
        assert_eq!(settings.lowest_pos_mm().unwrap(), None);

        settings.set_lowest_pos_mm(617).unwrap();
        assert_eq!(settings.lowest_pos_mm().unwrap(), Some(617));

        store.set(keys::LOWEST_POS_MM, json!("650")).unwrap();
        assert_eq!(settings.lowest_pos_mm().unwrap(), Some(650));

        store.set(keys::LOWEST_POS_MM, json!("tall")).unwrap();
        assert!(matches!(
            settings.lowest_pos_mm(),
            Err(Error::InvalidConfig(_))
        ));

        store.set(keys::LOWEST_POS_MM, json!(6.5)).unwrap();
        assert!(settings.lowest_pos_mm().is_err());
    }

    #[test]
    fn test_empty_device_id_is_unset() {
        let store = MemoryStore::new();
        store.set(keys::DEVICE_ID, json!("")).unwrap();

        let settings = DeskSettings::new(&store);
        assert_eq!(settings.device_id().unwrap(), None);
        assert!(settings.set_device_id("  ").is_err());

        settings.set_device_id(" E1:AA:BB:CC:DD:EE ").unwrap();
        assert_eq!(
            settings.device_id().unwrap().as_deref(),
            Some("E1:AA:BB:CC:DD:EE")
        );
    }

    #[test]
    fn test_require_reports_every_missing_setting() {
        let store = MemoryStore::new();
        let settings = DeskSettings::new(&store);

        let err = settings.require().unwrap_err();
        assert!(matches!(
            err,
            Error::NotConfigured { ref missing }
                if missing == &[Setting::DeviceId, Setting::LowestPosMm]
        ));

        settings.set_lowest_pos_mm(620).unwrap();
        let err = settings.require().unwrap_err();
        assert!(matches!(
            err,
            Error::NotConfigured { ref missing } if missing == &[Setting::DeviceId]
        ));

        settings.set_device_id("E1:AA:BB:CC:DD:EE").unwrap();
        let (id, cal) = settings.require().unwrap();
        assert_eq!(id, "E1:AA:BB:CC:DD:EE");
        assert_eq!(cal, Calibration::new(620));
    }

    #[test]
    fn test_positions_round_trip() {
        let store = MemoryStore::new();
        let settings = DeskSettings::new(&store);
        assert!(settings.positions().unwrap().is_empty());

        let mut positions = BTreeMap::new();
        positions.insert("desk_sit".to_string(), 700);
        settings.set_positions(&positions).unwrap();

        assert_eq!(
            store.get(keys::POSITIONS).unwrap(),
            Some(json!({"desk_sit": 700}))
        );
        assert_eq!(settings.positions().unwrap(), positions);
    }

    #[test]
    fn test_malformed_positions_are_reported() {
        let store = MemoryStore::with_document(
            json!({"positions": {"desk_sit": "high"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let err = DeskSettings::new(&store).positions().unwrap_err();
        assert!(err.to_string().contains("desk_sit"));

        store.set(keys::POSITIONS, json!([700])).unwrap();
        assert!(DeskSettings::new(&store).positions().is_err());
    }
}
