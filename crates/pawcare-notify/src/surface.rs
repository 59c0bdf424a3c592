//! Notification surfaces: where a fired reminder becomes visible.

use async_trait::async_trait;
use serde::Serialize;

use crate::permission::{PermissionState, StoredPermission};

/// Everything a surface needs to show one notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    /// Record id; surfaces may use it to collapse repeats.
    pub tag: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Click target.
    pub url: String,
}

/// Result of a single render attempt. Failures are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Shown,
    Failed(String),
}

/// Platform notification primitive.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Capability probe.
    fn is_supported(&self) -> bool;
    /// Current permission as the platform sees it.
    fn permission(&self) -> PermissionState;
    /// Ask the user. Only called from the `Default` state.
    async fn request_permission(&self) -> PermissionState;
    async fn render(&self, request: &RenderRequest) -> RenderOutcome;
}

/// Prints reminders to the terminal running `pawcare run`.
pub struct TerminalSurface {
    permission: StoredPermission,
}

impl TerminalSurface {
    pub fn new(permission: StoredPermission) -> Self {
        Self { permission }
    }
}

#[async_trait]
impl NotificationSurface for TerminalSurface {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PermissionState {
        self.permission.get()
    }

    async fn request_permission(&self) -> PermissionState {
        // Running the request command is the user's answer.
        self.permission.grant()
    }

    async fn render(&self, request: &RenderRequest) -> RenderOutcome {
        tracing::info!("🔔 {}: {}", request.title, request.body);
        println!("\n🐾 {}\n   {}\n   → {}\n", request.title, request.body, request.url);
        RenderOutcome::Shown
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake surface that records every render call.
    pub struct RecordingSurface {
        supported: bool,
        permission: Mutex<PermissionState>,
        answer: Mutex<PermissionState>,
        fail_renders: bool,
        renders: Mutex<Vec<RenderRequest>>,
        requests: AtomicUsize,
    }

    impl RecordingSurface {
        pub fn new(permission: PermissionState) -> Self {
            Self {
                supported: true,
                permission: Mutex::new(permission),
                answer: Mutex::new(PermissionState::Granted),
                fail_renders: false,
                renders: Mutex::new(Vec::new()),
                requests: AtomicUsize::new(0),
            }
        }

        pub fn granted() -> Self {
            Self::new(PermissionState::Granted)
        }

        pub fn unsupported() -> Self {
            Self {
                supported: false,
                ..Self::new(PermissionState::Default)
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_renders: true,
                ..Self::granted()
            }
        }

        pub fn set_permission(&self, state: PermissionState) {
            *self.permission.lock().unwrap() = state;
        }

        pub fn answer_with(&self, state: PermissionState) {
            *self.answer.lock().unwrap() = state;
        }

        pub fn renders(&self) -> Vec<RenderRequest> {
            self.renders.lock().unwrap().clone()
        }

        pub fn render_count(&self) -> usize {
            self.renders.lock().unwrap().len()
        }

        pub fn permission_requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationSurface for RecordingSurface {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn permission(&self) -> PermissionState {
            *self.permission.lock().unwrap()
        }

        async fn request_permission(&self) -> PermissionState {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let answer = *self.answer.lock().unwrap();
            self.set_permission(answer);
            answer
        }

        async fn render(&self, request: &RenderRequest) -> RenderOutcome {
            self.renders.lock().unwrap().push(request.clone());
            if self.fail_renders {
                RenderOutcome::Failed("surface closed".into())
            } else {
                RenderOutcome::Shown
            }
        }
    }
}
