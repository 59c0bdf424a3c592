//! PawCare configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PawcareError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PawcareConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl PawcareConfig {
    /// Load config from the default path (~/.pawcare/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PawcareError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PawcareError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the given path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PawcareError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the PawCare home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pawcare")
    }
}

/// Which key-value backend holds persisted reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key in a directory.
    File,
    /// Single SQLite database file.
    Sqlite,
    /// Process memory only; nothing survives a restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Directory for `file`, database path for `sqlite`. Tilde is expanded.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_backend() -> StorageBackend { StorageBackend::File }
fn default_storage_path() -> String { "~/.pawcare/storage".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    /// Storage path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Where rendered notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Terminal,
    Webhook,
}

/// Notification rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_surface")]
    pub surface: SurfaceKind,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Click target used when a reminder has no url of its own.
    #[serde(default = "default_url")]
    pub default_url: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub webhook_headers: Vec<(String, String)>,
}

fn default_surface() -> SurfaceKind { SurfaceKind::Terminal }
fn default_icon() -> String { "/icons/icon-192x192.png".into() }
fn default_url() -> String { "/".into() }

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            surface: default_surface(),
            icon: default_icon(),
            default_url: default_url(),
            webhook_url: String::new(),
            webhook_headers: Vec::new(),
        }
    }
}

/// Scheduler behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Drop fired and cancelled records from the store during `initialize()`.
    #[serde(default)]
    pub prune_on_start: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PawcareConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.notifications.surface, SurfaceKind::Terminal);
        assert_eq!(config.notifications.default_url, "/");
        assert!(!config.scheduler.prune_on_start);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [storage]
            backend = "sqlite"
            path = "/var/lib/pawcare/reminders.db"

            [notifications]
            surface = "webhook"
            webhook_url = "https://push.example.com/hook"
            webhook_headers = [["Authorization", "Bearer abc"]]

            [scheduler]
            prune_on_start = true
        "#;

        let config: PawcareConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(
            config.storage.resolved_path(),
            PathBuf::from("/var/lib/pawcare/reminders.db")
        );
        assert_eq!(config.notifications.surface, SurfaceKind::Webhook);
        assert_eq!(config.notifications.webhook_headers.len(), 1);
        assert_eq!(config.notifications.icon, "/icons/icon-192x192.png");
        assert!(config.scheduler.prune_on_start);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: PawcareConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.path, "~/.pawcare/storage");
        assert!(config.notifications.webhook_url.is_empty());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result: std::result::Result<PawcareConfig, _> =
            toml::from_str("[storage]\nbackend = \"redis\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("pawcare-config-test");
        let path = dir.join("config.toml");
        let mut config = PawcareConfig::default();
        config.scheduler.prune_on_start = true;
        config.save_to(&path).unwrap();

        let loaded = PawcareConfig::load_from(&path).unwrap();
        assert!(loaded.scheduler.prune_on_start);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_home_dir() {
        let home = PawcareConfig::home_dir();
        assert!(home.to_string_lossy().contains("pawcare"));
    }
}
