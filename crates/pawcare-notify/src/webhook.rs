//! Webhook surface: POSTs rendered reminders to an HTTP endpoint
//! (a push relay, a home-automation hook, a chat bridge).

use async_trait::async_trait;
use pawcare_core::{PawcareError, Result};

use crate::permission::{PermissionState, StoredPermission};
use crate::surface::{NotificationSurface, RenderOutcome, RenderRequest};

/// HTTP webhook surface.
pub struct WebhookSurface {
    url: String,
    headers: Vec<(String, String)>,
    permission: StoredPermission,
    client: reqwest::Client,
}

impl WebhookSurface {
    pub fn new(url: &str, headers: Vec<(String, String)>, permission: StoredPermission) -> Self {
        Self {
            url: url.to_string(),
            headers,
            permission,
            client: reqwest::Client::new(),
        }
    }

    /// JSON body sent for one reminder.
    pub fn payload(request: &RenderRequest) -> serde_json::Value {
        serde_json::json!({
            "tag": request.tag,
            "title": request.title,
            "body": request.body,
            "icon": request.icon,
            "data": { "url": request.url },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn post(&self, request: &RenderRequest) -> Result<()> {
        let mut req = self
            .client
            .post(&self.url)
            .json(&Self::payload(request))
            .timeout(std::time::Duration::from_secs(10));

        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PawcareError::Surface(format!("Webhook send failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(PawcareError::Surface(format!("Webhook error {}", resp.status())));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSurface for WebhookSurface {
    /// Unsupported until a URL is configured.
    fn is_supported(&self) -> bool {
        !self.url.is_empty()
    }

    fn permission(&self) -> PermissionState {
        self.permission.get()
    }

    async fn request_permission(&self) -> PermissionState {
        self.permission.grant()
    }

    async fn render(&self, request: &RenderRequest) -> RenderOutcome {
        match self.post(request).await {
            Ok(()) => {
                tracing::info!("✅ Webhook notification sent to {}: {}", self.url, request.title);
                RenderOutcome::Shown
            }
            Err(e) => RenderOutcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn permission() -> StoredPermission {
        StoredPermission::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_unconfigured_is_unsupported() {
        let surface = WebhookSurface::new("", vec![], permission());
        assert!(!surface.is_supported());
        let surface = WebhookSurface::new("https://push.example.com/hook", vec![], permission());
        assert!(surface.is_supported());
    }

    #[test]
    fn test_payload_carries_click_url() {
        let request = RenderRequest {
            tag: "water-bo".into(),
            title: "Water".into(),
            body: "Refill Bo's bowl".into(),
            icon: "/icons/icon-192x192.png".into(),
            url: "/records/water".into(),
        };
        let payload = WebhookSurface::payload(&request);
        assert_eq!(payload["tag"], "water-bo");
        assert_eq!(payload["data"]["url"], "/records/water");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_without_panicking() {
        let surface = WebhookSurface::new("http://127.0.0.1:9/hook", vec![], permission());
        let request = RenderRequest {
            tag: "t".into(),
            title: "T".into(),
            body: "B".into(),
            icon: String::new(),
            url: "/".into(),
        };
        match surface.render(&request).await {
            RenderOutcome::Failed(reason) => {
                assert!(reason.starts_with("Notification surface error: Webhook send failed"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
