//! Key-value storage boundary.
//!
//! Backends implement [`RawStorage`] and may fail. Everything above them talks
//! to [`KeyValueStorage`], which never fails: errors and malformed values are
//! logged and surface as `None` / `false`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pawcare_core::{PawcareError, Result};
use serde_json::Value;

/// Fallible string storage implemented by each backend.
pub trait RawStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Best-effort JSON key-value storage.
pub trait KeyValueStorage: Send + Sync {
    /// Stored value, telling a missing key (`Ok(None)`) apart from one that
    /// could not be read or parsed.
    fn try_get_data(&self, key: &str) -> Result<Option<Value>>;
    /// Stored value, or `None` if missing, unreadable, or malformed.
    fn get_data(&self, key: &str) -> Option<Value>;
    /// Returns `false` if the value could not be written.
    fn save_data(&self, key: &str, value: &Value) -> bool;
    fn remove_data(&self, key: &str);
    fn clear_all_data(&self);
}

impl<T: RawStorage + ?Sized> KeyValueStorage for T {
    fn try_get_data(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.read(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn get_data(&self, key: &str) -> Option<Value> {
        self.try_get_data(key).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Failed to read '{key}': {e}");
            None
        })
    }

    fn save_data(&self, key: &str, value: &Value) -> bool {
        let json = match serde_json::to_string_pretty(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("⚠️ Failed to serialize '{key}': {e}");
                return false;
            }
        };
        match self.write(key, &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️ Failed to save '{key}': {e}");
                false
            }
        }
    }

    fn remove_data(&self, key: &str) {
        if let Err(e) = self.delete(key) {
            tracing::warn!("⚠️ Failed to remove '{key}': {e}");
        }
    }

    fn clear_all_data(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!("⚠️ Failed to clear storage: {e}");
        }
    }
}

/// In-process storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        Ok(())
    }
}

/// File-based storage: one JSON file per key.
/// Human-readable; only touched when a value changes.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file store rooted at the given directory.
    pub fn new(dir: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("⚠️ Cannot create storage dir {}: {e}", dir.display());
        }
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl RawStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key);
        if !file.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&file)?))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let file = self.file_for(key);
        // Readers never see a half-written file.
        let tmp = file.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &file)?;
        tracing::debug!("💾 Saved '{key}' to {}", file.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let file = self.file_for(key);
        match std::fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PawcareError::Io(e)),
        }
    }

    fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
