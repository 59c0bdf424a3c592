//! Persistent notification store: the full record list under one key.
//! Every mutation is a read-modify-write of the whole list.

use std::sync::Arc;

use pawcare_core::Result;

use crate::record::NotificationRecord;
use crate::storage::KeyValueStorage;

/// Storage key holding the record list.
pub const NOTIFICATIONS_KEY: &str = "scheduled_notifications";

/// Record list persisted in key-value storage.
#[derive(Clone)]
pub struct NotificationStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl NotificationStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Underlying storage, shared with other keys (e.g. permission state).
    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::clone(&self.storage)
    }

    /// Persisted records. A missing key is an empty list; an unreadable or
    /// malformed one is an error.
    pub fn load(&self) -> Result<Vec<NotificationRecord>> {
        match self.storage.try_get_data(NOTIFICATIONS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// All persisted records. Missing or malformed data reads as empty.
    pub fn list(&self) -> Vec<NotificationRecord> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("⚠️ Failed to load stored notifications: {e}");
            Vec::new()
        })
    }

    /// Insert or replace the record with the same id.
    /// Fails rather than overwrite a list that cannot be read.
    pub fn upsert(&self, record: &NotificationRecord) -> bool {
        let mut records = match self.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("⚠️ Not saving '{}': stored notifications unreadable: {e}", record.id);
                return false;
            }
        };
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.replace_all(&records)
    }

    /// Overwrite the whole list.
    pub fn replace_all(&self, records: &[NotificationRecord]) -> bool {
        match serde_json::to_value(records) {
            Ok(value) => self.storage.save_data(NOTIFICATIONS_KEY, &value),
            Err(e) => {
                tracing::warn!("⚠️ Failed to serialize notifications: {e}");
                false
            }
        }
    }

    /// Drop every persisted record.
    pub fn clear(&self) {
        self.storage.remove_data(NOTIFICATIONS_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, RawStorage};
    use chrono::Utc;

    fn record(id: &str, title: &str) -> NotificationRecord {
        NotificationRecord::new(id, title, "body", Utc::now(), None)
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = NotificationStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = NotificationStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.upsert(&record("walk-bo", "Walk")));
        assert!(store.upsert(&record("feed-bo", "Feed")));
        assert!(store.upsert(&record("walk-bo", "Evening walk")));

        let records = store.list();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "walk-bo");
        assert_eq!(records[0].title, "Evening walk");
    }

    #[test]
    fn test_malformed_list_reads_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(NOTIFICATIONS_KEY, r#"{"id": "not-a-list"}"#).unwrap();
        let store = NotificationStore::new(storage);
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_upsert_keeps_unreadable_list_intact() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(NOTIFICATIONS_KEY, "[{\"id\": \"walk-bo\", truncated").unwrap();
        let store = NotificationStore::new(storage.clone());

        assert!(store.load().is_err());
        assert!(!store.upsert(&record("feed-bo", "Feed")));
        assert_eq!(
            storage.read(NOTIFICATIONS_KEY).unwrap().as_deref(),
            Some("[{\"id\": \"walk-bo\", truncated")
        );
    }

    #[test]
    fn test_replace_all_and_clear() {
        let store = NotificationStore::new(Arc::new(MemoryStorage::new()));
        store.replace_all(&[record("a", "A"), record("b", "B")]);
        assert_eq!(store.list().len(), 2);
        store.clear();
        assert!(store.list().is_empty());
    }
}
