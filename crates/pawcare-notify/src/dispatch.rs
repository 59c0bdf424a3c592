//! Notification dispatch: turns a fired record into a visible notification.
//!
//! The caller has already consumed the record; dispatch only decides whether
//! anything is shown. Suppressed and failed deliveries are final.

use std::sync::Arc;

use crate::permission::{PermissionGate, PermissionState};
use crate::record::NotificationRecord;
use crate::surface::{NotificationSurface, RenderOutcome, RenderRequest};

/// What happened to one fired record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Rendered,
    /// Permission was not granted; nothing was shown.
    Suppressed(PermissionState),
    /// The surface refused or errored; not retried.
    Failed(String),
}

/// Response to the user interacting with a shown notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickAction {
    /// Bring the app to the foreground.
    pub focus: bool,
    pub navigate_to: String,
}

/// Renders fired records through a surface, behind the permission gate.
#[derive(Clone)]
pub struct Dispatcher {
    surface: Arc<dyn NotificationSurface>,
    gate: PermissionGate,
    icon: String,
    default_url: String,
}

impl Dispatcher {
    pub fn new(surface: Arc<dyn NotificationSurface>) -> Self {
        Self {
            gate: PermissionGate::new(Arc::clone(&surface)),
            surface,
            icon: "/icons/icon-192x192.png".into(),
            default_url: "/".into(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn with_default_url(mut self, url: &str) -> Self {
        self.default_url = url.to_string();
        self
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Build the surface payload for a record.
    pub fn render_request(&self, record: &NotificationRecord) -> RenderRequest {
        RenderRequest {
            tag: record.id.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            icon: self.icon.clone(),
            url: record.url.clone().unwrap_or_else(|| self.default_url.clone()),
        }
    }

    /// Show a fired record if permission allows.
    pub async fn dispatch(&self, record: &NotificationRecord) -> DispatchOutcome {
        let permission = self.gate.state();
        if !permission.may_act() {
            tracing::info!(
                "🔕 Reminder '{}' suppressed (permission: {permission})",
                record.id
            );
            return DispatchOutcome::Suppressed(permission);
        }

        let request = self.render_request(record);
        match self.surface.render(&request).await {
            RenderOutcome::Shown => {
                tracing::info!("🔔 Reminder shown: '{}' ({})", record.title, record.id);
                DispatchOutcome::Rendered
            }
            RenderOutcome::Failed(reason) => {
                tracing::warn!("⚠️ Failed to show reminder '{}': {reason}", record.id);
                DispatchOutcome::Failed(reason)
            }
        }
    }

    /// Map a click on a shown notification to focus-and-navigate.
    pub fn on_click(&self, request: &RenderRequest) -> ClickAction {
        let navigate_to = if request.url.is_empty() {
            self.default_url.clone()
        } else {
            request.url.clone()
        };
        ClickAction {
            focus: true,
            navigate_to,
        }
    }
}
