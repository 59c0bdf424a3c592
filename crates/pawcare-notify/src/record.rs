//! Notification records: the only data that outlives the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A scheduled reminder as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Caller-supplied key, unique within the store.
    pub id: String,
    /// Display headline.
    pub title: String,
    /// Display detail.
    pub body: String,
    /// Intended fire time.
    pub scheduled_time: DateTime<Utc>,
    /// Deep-link target when the user interacts with the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// True while pending, false once fired or cancelled.
    pub is_active: bool,
    /// Set once the dispatcher has fired this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered: Option<bool>,
}

/// Lifecycle state derived from `is_active` / `triggered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Pending,
    Fired,
    Cancelled,
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordState::Pending => write!(f, "pending"),
            RecordState::Fired => write!(f, "fired"),
            RecordState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl NotificationRecord {
    /// Create a new pending record.
    pub fn new(
        id: &str,
        title: &str,
        body: &str,
        scheduled_time: DateTime<Utc>,
        url: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            scheduled_time,
            url: url.map(String::from),
            is_active: true,
            triggered: None,
        }
    }

    pub fn state(&self) -> RecordState {
        if self.is_active {
            RecordState::Pending
        } else if self.triggered == Some(true) {
            RecordState::Fired
        } else {
            RecordState::Cancelled
        }
    }

    /// Remaining time until the fire time, or `None` if it is already due.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.scheduled_time - now)
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
    }

    /// Terminal transition after firing (shown or suppressed).
    pub fn mark_triggered(&mut self) {
        self.is_active = false;
        self.triggered = Some(true);
    }

    /// Terminal transition after explicit cancellation.
    pub fn mark_cancelled(&mut self) {
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let at = Utc::now() + chrono::Duration::minutes(5);
        let record = NotificationRecord::new("walk-bo", "Walk", "Time for a walk", at, None);
        assert!(record.is_active);
        assert_eq!(record.triggered, None);
        assert_eq!(record.state(), RecordState::Pending);
    }

    #[test]
    fn test_terminal_states() {
        let at = Utc::now();
        let mut fired = NotificationRecord::new("a", "A", "a", at, None);
        fired.mark_triggered();
        assert_eq!(fired.state(), RecordState::Fired);

        let mut cancelled = NotificationRecord::new("b", "B", "b", at, None);
        cancelled.mark_cancelled();
        assert!(!cancelled.is_active);
        assert_eq!(cancelled.triggered, None);
        assert_eq!(cancelled.state(), RecordState::Cancelled);
    }

    #[test]
    fn test_delay_from() {
        let now = Utc::now();
        let record = NotificationRecord::new(
            "med-1",
            "Medication",
            "Give the evening dose",
            now + chrono::Duration::milliseconds(2000),
            None,
        );
        assert_eq!(record.delay_from(now), Some(Duration::from_millis(2000)));
        assert_eq!(record.delay_from(record.scheduled_time), None);
        assert_eq!(
            record.delay_from(now + chrono::Duration::seconds(10)),
            None
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = NotificationRecord::new("feed-bo", "Feed", "Dinner", at, Some("/records/feed"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["scheduledTime"], "2026-03-01T18:00:00Z");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["url"], "/records/feed");
        assert!(json.get("triggered").is_none());
    }

    #[test]
    fn test_parses_stored_list_without_optional_fields() {
        let raw = r#"[{"id":"x","title":"T","body":"B",
            "scheduledTime":"2026-03-01T18:00:00.000Z","isActive":false,"triggered":true}]"#;
        let records: Vec<NotificationRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records[0].url, None);
        assert_eq!(records[0].state(), RecordState::Fired);
    }
}
