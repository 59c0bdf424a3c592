//! Permission gate: decides whether the dispatcher may show anything.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStorage;
use crate::surface::NotificationSurface;

/// Platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The platform cannot show notifications at all.
    Unsupported,
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn may_act(self) -> bool {
        self == PermissionState::Granted
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Unsupported => write!(f, "unsupported"),
            PermissionState::Default => write!(f, "default"),
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
        }
    }
}

/// Reads permission from the surface on every check; nothing is cached.
#[derive(Clone)]
pub struct PermissionGate {
    surface: Arc<dyn NotificationSurface>,
}

impl PermissionGate {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self { surface }
    }

    pub fn state(&self) -> PermissionState {
        if !self.surface.is_supported() {
            return PermissionState::Unsupported;
        }
        self.surface.permission()
    }

    pub fn may_act(&self) -> bool {
        self.state().may_act()
    }

    /// Ask the user, but only from the `default` state.
    /// A previous denial is final; there is no re-prompt.
    pub async fn request(&self) -> bool {
        match self.state() {
            PermissionState::Unsupported => {
                tracing::warn!("⚠️ Notifications are not supported on this surface");
                false
            }
            PermissionState::Granted => true,
            PermissionState::Denied => {
                tracing::info!("🔕 Notification permission was denied earlier; not asking again");
                false
            }
            PermissionState::Default => {
                let answer = self.surface.request_permission().await;
                tracing::info!("🔔 Notification permission: {answer}");
                answer.may_act()
            }
        }
    }
}

/// Storage key for a remembered permission decision.
pub const PERMISSION_KEY: &str = "notification_permission";

/// Permission decision remembered in key-value storage, the way a platform
/// remembers the user's answer across restarts.
#[derive(Clone)]
pub struct StoredPermission {
    storage: Arc<dyn KeyValueStorage>,
}

impl StoredPermission {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current decision; `Default` when nothing valid is stored.
    pub fn get(&self) -> PermissionState {
        self.storage
            .get_data(PERMISSION_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
            .filter(|s| *s != PermissionState::Unsupported)
            .unwrap_or(PermissionState::Default)
    }

    /// Returns `false` if the decision could not be remembered.
    pub fn set(&self, state: PermissionState) -> bool {
        let saved = match serde_json::to_value(state) {
            Ok(value) => self.storage.save_data(PERMISSION_KEY, &value),
            Err(_) => false,
        };
        if !saved {
            tracing::warn!("⚠️ Notification permission '{state}' not saved; it will be asked again");
        }
        saved
    }

    /// Record a grant and report what is actually remembered.
    pub fn grant(&self) -> PermissionState {
        self.set(PermissionState::Granted);
        self.get()
    }

    /// Forget the decision so the next request asks again.
    pub fn reset(&self) {
        self.storage.remove_data(PERMISSION_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::surface::testing::RecordingSurface;

    #[tokio::test]
    async fn test_unsupported_never_acts() {
        let surface = Arc::new(RecordingSurface::unsupported());
        let gate = PermissionGate::new(surface.clone());
        assert_eq!(gate.state(), PermissionState::Unsupported);
        assert!(!gate.request().await);
        assert_eq!(surface.permission_requests(), 0);
    }

    #[tokio::test]
    async fn test_default_prompts_once() {
        let surface = Arc::new(RecordingSurface::new(PermissionState::Default));
        surface.answer_with(PermissionState::Granted);
        let gate = PermissionGate::new(surface.clone());

        assert!(!gate.may_act());
        assert!(gate.request().await);
        assert!(gate.may_act());
        assert!(gate.request().await);
        assert_eq!(surface.permission_requests(), 1);
    }

    #[tokio::test]
    async fn test_denied_is_not_reprompted() {
        let surface = Arc::new(RecordingSurface::new(PermissionState::Default));
        surface.answer_with(PermissionState::Denied);
        let gate = PermissionGate::new(surface.clone());

        assert!(!gate.request().await);
        assert!(!gate.request().await);
        assert_eq!(gate.state(), PermissionState::Denied);
        assert_eq!(surface.permission_requests(), 1);
    }

    #[test]
    fn test_gate_rereads_surface_state() {
        let surface = Arc::new(RecordingSurface::new(PermissionState::Granted));
        let gate = PermissionGate::new(surface.clone());
        assert!(gate.may_act());
        surface.set_permission(PermissionState::Denied);
        assert!(!gate.may_act());
    }

    struct UnwritableStorage;

    impl crate::storage::RawStorage for UnwritableStorage {
        fn read(&self, _key: &str) -> pawcare_core::Result<Option<String>> {
            Ok(None)
        }
        fn write(&self, _key: &str, _value: &str) -> pawcare_core::Result<()> {
            Err(pawcare_core::PawcareError::Storage("read-only".into()))
        }
        fn delete(&self, _key: &str) -> pawcare_core::Result<()> {
            Ok(())
        }
        fn clear(&self) -> pawcare_core::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unsaved_grant_is_not_reported() {
        let stored = StoredPermission::new(Arc::new(UnwritableStorage));
        assert!(!stored.set(PermissionState::Denied));
        assert_eq!(stored.grant(), PermissionState::Default);
    }

    #[test]
    fn test_stored_permission() {
        let storage = Arc::new(MemoryStorage::new());
        let stored = StoredPermission::new(storage.clone());
        assert_eq!(stored.get(), PermissionState::Default);
        assert!(stored.set(PermissionState::Granted));
        assert_eq!(StoredPermission::new(storage).get(), PermissionState::Granted);
        stored.reset();
        assert_eq!(stored.get(), PermissionState::Default);
    }
}
