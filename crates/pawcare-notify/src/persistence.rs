//! SQLite-backed key-value storage.
//! Same contract as the JSON file store, but a single file with atomic writes.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use pawcare_core::{PawcareError, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::storage::RawStorage;

/// SQLite key-value store.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

fn db_err(context: &str, e: rusqlite::Error) -> PawcareError {
    PawcareError::Storage(format!("{context}: {e}"))
}

impl SqliteStorage {
    /// Open or create the storage database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| db_err("DB open", e))?;
        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("DB open", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run migrations to create tables.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,       -- JSON document
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| db_err("Migration", e))
    }
}

impl RawStorage for SqliteStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| db_err("Read", e))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(|e| db_err("Write", e))?;
        tracing::debug!("💾 Saved '{key}' to SQLite");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM kv_store WHERE key = ?1", rusqlite::params![key])
            .map_err(|e| db_err("Delete", e))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM kv_store", [])
            .map_err(|e| db_err("Clear", e))?;
        Ok(())
    }
}
