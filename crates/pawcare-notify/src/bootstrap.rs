//! Build a scheduler from `PawcareConfig`.

use std::sync::Arc;

use pawcare_core::config::{NotificationConfig, StorageBackend, StorageConfig, SurfaceKind};
use pawcare_core::{PawcareConfig, Result};

use crate::dispatch::Dispatcher;
use crate::engine::NotificationScheduler;
use crate::permission::StoredPermission;
use crate::persistence::SqliteStorage;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::store::NotificationStore;
use crate::surface::{NotificationSurface, TerminalSurface};
use crate::webhook::WebhookSurface;

/// Open the configured key-value backend.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn KeyValueStorage>> {
    let path = config.resolved_path();
    let storage: Arc<dyn KeyValueStorage> = match config.backend {
        StorageBackend::File => Arc::new(FileStorage::new(&path)),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&path)?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    tracing::debug!("💾 Storage: {:?} at {}", config.backend, path.display());
    Ok(storage)
}

/// Build the configured surface. Permission decisions live in `storage`.
pub fn build_surface(
    config: &NotificationConfig,
    storage: Arc<dyn KeyValueStorage>,
) -> Arc<dyn NotificationSurface> {
    let permission = StoredPermission::new(storage);
    match config.surface {
        SurfaceKind::Terminal => Arc::new(TerminalSurface::new(permission)),
        SurfaceKind::Webhook => {
            if config.webhook_url.is_empty() {
                tracing::warn!("⚠️ Webhook surface selected but notifications.webhook_url is empty");
            }
            Arc::new(WebhookSurface::new(
                &config.webhook_url,
                config.webhook_headers.clone(),
                permission,
            ))
        }
    }
}

/// Wire storage, surface, dispatcher, and scheduler together.
pub fn build_scheduler(config: &PawcareConfig) -> Result<NotificationScheduler> {
    let storage = open_storage(&config.storage)?;
    let surface = build_surface(&config.notifications, Arc::clone(&storage));
    let dispatcher = Dispatcher::new(surface)
        .with_icon(&config.notifications.icon)
        .with_default_url(&config.notifications.default_url);
    Ok(NotificationScheduler::with_config(
        NotificationStore::new(storage),
        dispatcher,
        &config.scheduler,
    ))
}
