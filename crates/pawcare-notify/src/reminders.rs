//! Pet-care reminder presets for the health-record categories.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{NotificationScheduler, ScheduleOutcome};

/// Health-record category a reminder points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    Walk,
    Feed,
    Water,
    Weight,
    HealthCheck,
    Medication,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 6] = [
        ReminderKind::Walk,
        ReminderKind::Feed,
        ReminderKind::Water,
        ReminderKind::Weight,
        ReminderKind::HealthCheck,
        ReminderKind::Medication,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ReminderKind::Walk => "walk",
            ReminderKind::Feed => "feed",
            ReminderKind::Water => "water",
            ReminderKind::Weight => "weight",
            ReminderKind::HealthCheck => "health-check",
            ReminderKind::Medication => "medication",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ReminderKind::Walk => "Walk time",
            ReminderKind::Feed => "Feeding time",
            ReminderKind::Water => "Fresh water",
            ReminderKind::Weight => "Weigh-in",
            ReminderKind::HealthCheck => "Health check",
            ReminderKind::Medication => "Medication",
        }
    }

    fn body(self, pet: &str) -> String {
        match self {
            ReminderKind::Walk => format!("{pet} is ready for a walk."),
            ReminderKind::Feed => format!("Time to feed {pet}."),
            ReminderKind::Water => format!("Refill {pet}'s water bowl."),
            ReminderKind::Weight => format!("Log {pet}'s weight today."),
            ReminderKind::HealthCheck => format!("Time for {pet}'s health check."),
            ReminderKind::Medication => format!("Give {pet} their medication."),
        }
    }
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        ReminderKind::ALL
            .into_iter()
            .find(|k| k.slug() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = ReminderKind::ALL.iter().map(|k| k.slug()).collect();
                format!("unknown reminder kind '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// A reminder for one pet. The id is stable per (kind, pet), so scheduling
/// the same reminder again replaces the pending one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetReminder {
    pub kind: ReminderKind,
    pub pet: String,
    pub note: Option<String>,
}

impl PetReminder {
    pub fn new(kind: ReminderKind, pet: &str) -> Self {
        Self {
            kind,
            pet: pet.trim().to_string(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        let note = note.trim();
        if !note.is_empty() {
            self.note = Some(note.to_string());
        }
        self
    }

    pub fn id(&self) -> String {
        format!("{}-{}", self.kind.slug(), slugify(&self.pet))
    }

    pub fn title(&self) -> String {
        format!("{}: {}", self.kind.title(), self.pet)
    }

    pub fn body(&self) -> String {
        let base = self.kind.body(&self.pet);
        match &self.note {
            Some(note) => format!("{base} Note: {note}"),
            None => base,
        }
    }

    /// Record page the notification opens.
    pub fn url(&self) -> String {
        format!("/records/{}", self.kind.slug())
    }

    pub async fn schedule(
        &self,
        scheduler: &NotificationScheduler,
        at: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let url = self.url();
        scheduler
            .schedule(&self.id(), &self.title(), &self.body(), at, Some(&url))
            .await
    }

    pub async fn cancel(&self, scheduler: &NotificationScheduler) -> bool {
        scheduler.cancel(&self.id()).await
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "pet".into()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::storage::MemoryStorage;
    use crate::store::NotificationStore;
    use crate::surface::testing::RecordingSurface;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_ids_are_stable_per_pet() {
        let reminder = PetReminder::new(ReminderKind::HealthCheck, "  Mr. Biscuits ");
        assert_eq!(reminder.id(), "health-check-mr-biscuits");
        assert_eq!(reminder.url(), "/records/health-check");
        assert_eq!(PetReminder::new(ReminderKind::Walk, "!!!").id(), "walk-pet");
    }

    #[test]
    fn test_title_and_body() {
        let reminder = PetReminder::new(ReminderKind::Medication, "Bo").with_note("Half a tablet");
        assert_eq!(reminder.title(), "Medication: Bo");
        assert_eq!(reminder.body(), "Give Bo their medication. Note: Half a tablet");
        assert_eq!(PetReminder::new(ReminderKind::Feed, "Bo").with_note("  ").note, None);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("walk".parse::<ReminderKind>().unwrap(), ReminderKind::Walk);
        assert_eq!("Health_Check".parse::<ReminderKind>().unwrap(), ReminderKind::HealthCheck);
        assert!("bath".parse::<ReminderKind>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_reminder() {
        let surface = Arc::new(RecordingSurface::granted());
        let scheduler = NotificationScheduler::new(
            NotificationStore::new(Arc::new(MemoryStorage::new())),
            Dispatcher::new(surface.clone()),
        );
        let walk = PetReminder::new(ReminderKind::Walk, "Bo");
        let soon = Utc::now() + chrono::Duration::seconds(30);
        walk.schedule(&scheduler, soon).await;
        walk.clone()
            .with_note("Take the long route")
            .schedule(&scheduler, soon + chrono::Duration::seconds(30))
            .await;

        let active = scheduler.list_active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "walk-bo");

        tokio::time::sleep(Duration::from_secs(90)).await;
        let renders = surface.renders();
        assert_eq!(renders.len(), 1);
        assert!(renders[0].body.ends_with("Take the long route"));
        assert_eq!(renders[0].url, "/records/walk");

        assert!(!walk.cancel(&scheduler).await);
    }
}
