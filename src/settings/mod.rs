//! Key-value persistence for tempo and time signature.
//!
//! The engine never touches storage. The host restores saved values through
//! the ordinary setters at startup and saves again whenever a command changes
//! them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::MetronomeEngine;
use crate::metronome::{Bpm, TimeSignature};
use crate::timer::TimerHost;

pub const BPM_KEY: &str = "metronome_bpm";
pub const TIME_SIGNATURE_KEY: &str = "metronome_time_signature";

const SETTINGS_VERSION: u32 = 1;

/// Get the default settings file (~/.beatkeeper/settings.json)
pub fn default_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".beatkeeper").join("settings.json")
}

pub trait KeyValueStore {
    fn save_value(&mut self, key: &str, value: Value) -> Result<()>;

    fn load_value(&self, key: &str) -> Option<Value>;

    fn save<V: Serialize>(&mut self, key: &str, value: &V) -> Result<()>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize setting {}", key))?;
        self.save_value(key, value)
    }

    /// Load a typed value, falling back to `default` when it is missing or
    /// does not parse
    fn load<V: DeserializeOwned>(&self, key: &str, default: V) -> V
    where
        Self: Sized,
    {
        match self.load_value(key) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("ignoring stored {}: {}", key, e);
                default
            }),
            None => default,
        }
    }
}

/// Volatile store, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn save_value(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn load_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Serializable settings document
#[derive(Clone, Serialize, Deserialize)]
struct SettingsData {
    version: u32,
    values: BTreeMap<String, Value>,
}

/// Store backed by a JSON document, rewritten on every save
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open the document at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            read_document(&path)?.values
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let document = SettingsData {
            version: SETTINGS_VERSION,
            values: self.values.clone(),
        };
        let json =
            serde_json::to_string_pretty(&document).context("Failed to serialize settings")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn save_value(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.write()
    }

    fn load_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

fn read_document(path: &Path) -> Result<SettingsData> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // Peek at version before committing to a layout
    let raw: Value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(1);
    if u32::try_from(version).map_or(true, |v| v > SETTINGS_VERSION) {
        bail!(
            "Settings version {} is newer than supported version {}",
            version,
            SETTINGS_VERSION
        );
    }

    serde_json::from_value(raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Apply stored tempo and signature through the engine's setters
pub fn restore<T: TimerHost, S: KeyValueStore>(engine: &mut MetronomeEngine<T>, store: &S) {
    let bpm: u64 = store.load(BPM_KEY, u64::from(Bpm::default().get()));
    let accepted = u16::try_from(bpm)
        .map(|bpm| engine.set_bpm(bpm))
        .unwrap_or(false);
    if !accepted {
        log::warn!("ignoring stored tempo {}", bpm);
    }

    let signature = store.load(TIME_SIGNATURE_KEY, TimeSignature::default());
    engine.set_time_signature(signature.numerator(), signature.denominator());
}

/// Save the engine's tempo and signature
pub fn persist<T: TimerHost, S: KeyValueStore>(
    engine: &MetronomeEngine<T>,
    store: &mut S,
) -> Result<()> {
    store.save(BPM_KEY, &engine.bpm())?;
    store.save(TIME_SIGNATURE_KEY, &engine.time_signature())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::timer::ManualTimer;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.load(BPM_KEY, 120u64), 120);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store
            .save_value(TIME_SIGNATURE_KEY, json!({"numerator": 0, "denominator": 4}))
            .unwrap();
        assert_eq!(
            store.load(TIME_SIGNATURE_KEY, TimeSignature::default()),
            TimeSignature::default()
        );
    }

    #[test]
    fn restore_applies_saved_values() {
        let mut store = MemoryStore::new();
        store.save_value(BPM_KEY, json!(84)).unwrap();
        store
            .save_value(TIME_SIGNATURE_KEY, json!({"numerator": 6, "denominator": 8}))
            .unwrap();

        let mut engine = MetronomeEngine::new(ManualTimer::new());
        restore(&mut engine, &store);
        assert_eq!(engine.bpm().get(), 84);
        assert_eq!(engine.time_signature().to_string(), "6/8");
    }

    #[test]
    fn restore_ignores_out_of_range_tempo() {
        let mut store = MemoryStore::new();
        store.save_value(BPM_KEY, json!(1000)).unwrap();
        let mut engine = MetronomeEngine::new(ManualTimer::new());
        restore(&mut engine, &store);
        assert_eq!(engine.bpm().get(), 120);
    }

    #[test]
    fn persist_then_restore_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut engine = MetronomeEngine::new(ManualTimer::new());
        engine.set_bpm(172);
        engine.set_time_signature(7, 8);
        let mut store = JsonFileStore::open(&path).unwrap();
        persist(&engine, &mut store).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        let mut restored = MetronomeEngine::new(ManualTimer::new());
        restore(&mut restored, &reopened);
        assert_eq!(restored.bpm().get(), 172);
        assert_eq!(restored.time_signature().to_string(), "7/8");
    }

    #[test]
    fn newer_document_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"version": 9, "values": {}}"#).unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }

    #[test]
    fn version_past_u32_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"version": 4294967297, "values": {}}"#).unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
