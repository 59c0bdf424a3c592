//! Scheduler engine: arms one tokio timer per pending reminder.
//!
//! The record list is mirrored in memory and written through to the store on
//! every change. Other processes (one-shot CLI commands) write the same store,
//! so a due timer re-reads its record before showing it and a long-running
//! process merges stored changes with [`NotificationScheduler::sync_from_store`].
//! Records whose last write failed are trusted from memory, so timers keep
//! firing when storage is broken.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pawcare_core::config::SchedulerConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::dispatch::Dispatcher;
use crate::permission::PermissionState;
use crate::record::NotificationRecord;
use crate::store::NotificationStore;

/// Result of a `schedule` call. Informational only; nothing is raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Armed { delay: Duration },
    /// Fire time was not strictly in the future.
    PastSchedule,
    /// The surface cannot show notifications at all.
    CapabilityUnavailable,
}

/// Summary of one `initialize()` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RehydrationReport {
    /// Future records with a fresh timer.
    pub rearmed: usize,
    /// Past-due records consumed without being shown.
    pub expired: usize,
    /// Records whose timer was already running in this process.
    pub already_armed: usize,
    /// Terminal records dropped (only with `prune_on_start`).
    pub pruned: usize,
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Ledger {
    records: Vec<NotificationRecord>,
    armed: HashMap<String, ArmedTimer>,
    /// Ids whose latest version never reached the store.
    unsynced: HashSet<String>,
    next_generation: u64,
}

impl Ledger {
    fn active_mut(&mut self, id: &str) -> Option<&mut NotificationRecord> {
        self.records.iter_mut().find(|r| r.id == id && r.is_active)
    }

    fn put(&mut self, record: NotificationRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}

struct Shared {
    ledger: Mutex<Ledger>,
    store: NotificationStore,
    dispatcher: Dispatcher,
    prune_on_start: bool,
}

impl Shared {
    fn persist(&self, ledger: &mut Ledger, record: &NotificationRecord) {
        if self.store.upsert(record) {
            ledger.unsynced.remove(&record.id);
        } else {
            ledger.unsynced.insert(record.id.clone());
            tracing::warn!("⚠️ Reminder '{}' not persisted; it will not survive a restart", record.id);
        }
    }

    fn persist_all(&self, ledger: &mut Ledger) -> bool {
        if self.store.replace_all(&ledger.records) {
            ledger.unsynced.clear();
            true
        } else {
            ledger.unsynced.extend(ledger.records.iter().map(|r| r.id.clone()));
            false
        }
    }
}

/// Process-scoped reminder scheduler.
///
/// Cheap to clone; clones share timers and state.
#[derive(Clone)]
pub struct NotificationScheduler {
    shared: Arc<Shared>,
}

impl NotificationScheduler {
    /// Create a scheduler over a store. Nothing is armed until `initialize()`.
    pub fn new(store: NotificationStore, dispatcher: Dispatcher) -> Self {
        Self::with_config(store, dispatcher, &SchedulerConfig::default())
    }

    pub fn with_config(
        store: NotificationStore,
        dispatcher: Dispatcher,
        config: &SchedulerConfig,
    ) -> Self {
        let ledger = Ledger {
            records: store.list(),
            ..Ledger::default()
        };
        Self {
            shared: Arc::new(Shared {
                ledger: Mutex::new(ledger),
                store,
                dispatcher,
                prune_on_start: config.prune_on_start,
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.shared.dispatcher
    }

    pub fn store(&self) -> &NotificationStore {
        &self.shared.store
    }

    pub fn permission(&self) -> PermissionState {
        self.shared.dispatcher.gate().state()
    }

    /// Ask the user for notification permission. Never re-prompts after a denial.
    pub async fn request_permission(&self) -> bool {
        self.shared.dispatcher.gate().request().await
    }

    /// Schedule a reminder, replacing any pending one with the same id.
    pub async fn schedule(
        &self,
        id: &str,
        title: &str,
        body: &str,
        at: DateTime<Utc>,
        url: Option<&str>,
    ) -> ScheduleOutcome {
        if self.permission() == PermissionState::Unsupported {
            tracing::debug!("Notifications unsupported; ignoring reminder '{id}'");
            return ScheduleOutcome::CapabilityUnavailable;
        }

        let record = NotificationRecord::new(id, title, body, at, url);
        let Some(delay) = record.delay_from(Utc::now()) else {
            tracing::warn!("⚠️ Reminder '{id}' is scheduled in the past ({at}); ignoring");
            return ScheduleOutcome::PastSchedule;
        };

        let mut ledger = self.shared.ledger.lock().await;
        if Self::cancel_locked(&mut ledger, id) {
            tracing::debug!("Replacing pending reminder '{id}'");
        }
        ledger.put(record.clone());
        self.shared.persist(&mut ledger, &record);
        arm_locked(&self.shared, &mut ledger, id, delay);

        tracing::info!("📅 Reminder scheduled: '{title}' ({id}) at {at}");
        ScheduleOutcome::Armed { delay }
    }

    /// Cancel a pending reminder. Returns `false` if nothing was pending.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut ledger = self.shared.ledger.lock().await;
        if !Self::cancel_locked(&mut ledger, id) {
            return false;
        }
        if let Some(record) = ledger.records.iter().find(|r| r.id == id).cloned() {
            self.shared.persist(&mut ledger, &record);
        }
        tracing::info!("🗑️ Reminder cancelled: {id}");
        true
    }

    /// Pending reminders.
    pub async fn list_active(&self) -> Vec<NotificationRecord> {
        let ledger = self.shared.ledger.lock().await;
        ledger.records.iter().filter(|r| r.is_active).cloned().collect()
    }

    /// Every known record, including fired and cancelled ones.
    pub async fn list_all(&self) -> Vec<NotificationRecord> {
        self.shared.ledger.lock().await.records.clone()
    }

    pub async fn armed_count(&self) -> usize {
        self.shared.ledger.lock().await.armed.len()
    }

    /// Reconcile persisted records with the clock. Call once per process
    /// start; repeated calls never arm a second timer for the same id.
    ///
    /// Past-due records are consumed without being shown: a reminder that was
    /// missed while the app was closed is not delivered late.
    pub async fn initialize(&self) -> RehydrationReport {
        let mut ledger = self.shared.ledger.lock().await;
        for persisted in self.shared.store.list() {
            if !ledger.records.iter().any(|r| r.id == persisted.id) {
                ledger.records.push(persisted);
            }
        }

        let now = Utc::now();
        let pending: Vec<(String, Option<Duration>)> = ledger
            .records
            .iter()
            .filter(|r| r.is_active)
            .map(|r| (r.id.clone(), r.delay_from(now)))
            .collect();

        let mut report = RehydrationReport::default();
        let mut changed = false;
        for (id, delay) in pending {
            if ledger.armed.contains_key(&id) {
                report.already_armed += 1;
                continue;
            }
            match delay {
                Some(delay) => {
                    arm_locked(&self.shared, &mut ledger, &id, delay);
                    report.rearmed += 1;
                }
                None => {
                    if let Some(record) = ledger.active_mut(&id) {
                        record.mark_triggered();
                        tracing::info!("⏭️ Missed reminder '{id}' expired while offline");
                    }
                    report.expired += 1;
                    changed = true;
                }
            }
        }

        if self.shared.prune_on_start {
            report.pruned = Self::prune_locked(&mut ledger);
            changed |= report.pruned > 0;
        }

        if changed && !self.shared.persist_all(&mut ledger) {
            tracing::warn!("⚠️ Rehydrated reminders not persisted");
        }

        tracing::info!(
            "⏰ Reminders rehydrated: {} re-armed, {} expired, {} already armed, {} pruned",
            report.rearmed,
            report.expired,
            report.already_armed,
            report.pruned
        );
        report
    }

    /// Drop fired and cancelled records. Returns how many were removed.
    pub async fn prune_terminal(&self) -> usize {
        let mut ledger = self.shared.ledger.lock().await;
        let pruned = Self::prune_locked(&mut ledger);
        if pruned > 0 {
            self.shared.persist_all(&mut ledger);
        }
        pruned
    }

    /// Abort every timer and remove all records, in memory and in the store.
    pub async fn clear_all(&self) {
        let mut ledger = self.shared.ledger.lock().await;
        for (_, timer) in ledger.armed.drain() {
            timer.handle.abort();
        }
        ledger.records.clear();
        ledger.unsynced.clear();
        self.shared.store.clear();
        tracing::info!("🧹 All reminders cleared");
    }

    /// Merge what other processes wrote to the store since the last look.
    ///
    /// New reminders are armed, reminders cancelled or rescheduled elsewhere
    /// follow the stored copy, and reminders deleted elsewhere are dropped.
    /// Returns how many records changed.
    pub async fn sync_from_store(&self) -> usize {
        let stored = match self.shared.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!("Store unreadable, keeping in-memory reminders: {e}");
                return 0;
            }
        };

        let mut ledger = self.shared.ledger.lock().await;
        let removed: Vec<String> = ledger
            .records
            .iter()
            .filter(|r| !ledger.unsynced.contains(&r.id) && !stored.iter().any(|s| s.id == r.id))
            .map(|r| r.id.clone())
            .collect();

        let mut changed = 0;
        for id in removed {
            if let Some(timer) = ledger.armed.remove(&id) {
                timer.handle.abort();
            }
            ledger.records.retain(|r| r.id != id);
            tracing::info!("🗑️ Reminder '{id}' was deleted elsewhere");
            changed += 1;
        }

        for record in stored {
            if ledger.unsynced.contains(&record.id)
                || ledger.records.iter().any(|r| *r == record)
            {
                continue;
            }
            tracing::info!("🔄 Reminder '{}' changed elsewhere", record.id);
            adopt_locked(&self.shared, &mut ledger, record);
            changed += 1;
        }
        changed
    }

    /// Abort every timer without touching records, so the next
    /// `initialize()` re-arms them. Returns how many timers were stopped.
    pub async fn shutdown(&self) -> usize {
        let mut ledger = self.shared.ledger.lock().await;
        let stopped = ledger.armed.len();
        for (_, timer) in ledger.armed.drain() {
            timer.handle.abort();
        }
        stopped
    }

    fn cancel_locked(ledger: &mut Ledger, id: &str) -> bool {
        if let Some(timer) = ledger.armed.remove(id) {
            timer.handle.abort();
        }
        match ledger.active_mut(id) {
            Some(record) => {
                record.mark_cancelled();
                true
            }
            None => false,
        }
    }

    fn prune_locked(ledger: &mut Ledger) -> usize {
        let before = ledger.records.len();
        ledger.records.retain(|r| r.is_active);
        before - ledger.records.len()
    }
}

fn arm_locked(shared: &Arc<Shared>, ledger: &mut Ledger, id: &str, delay: Duration) {
    ledger.next_generation += 1;
    let generation = ledger.next_generation;
    let handle = tokio::spawn(fire_after(
        Arc::clone(shared),
        id.to_string(),
        generation,
        delay,
    ));
    if let Some(previous) = ledger.armed.insert(id.to_string(), ArmedTimer { generation, handle }) {
        previous.handle.abort();
    }
}

/// Replace the in-memory copy with one another process stored.
/// A pending copy is re-armed; one already due fires right away.
fn adopt_locked(shared: &Arc<Shared>, ledger: &mut Ledger, stored: NotificationRecord) {
    let id = stored.id.clone();
    if let Some(timer) = ledger.armed.remove(&id) {
        timer.handle.abort();
    }
    let delay = stored
        .is_active
        .then(|| stored.delay_from(Utc::now()).unwrap_or(Duration::ZERO));
    ledger.put(stored);
    if let Some(delay) = delay {
        arm_locked(shared, ledger, &id, delay);
    }
}

/// Timer body: sleep, claim the record, then dispatch outside the lock.
async fn fire_after(shared: Arc<Shared>, id: String, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;

    let record = {
        let mut ledger = shared.ledger.lock().await;
        // Cancelled or replaced while this callback was queued.
        if ledger.armed.get(&id).map(|t| t.generation) != Some(generation) {
            tracing::debug!("Stale timer for '{id}' ignored");
            return;
        }
        ledger.armed.remove(&id);

        let Some(local) = ledger.active_mut(&id).cloned() else {
            return;
        };
        // The stored copy wins if another process changed it.
        if !ledger.unsynced.contains(&id) {
            match shared.store.load() {
                Ok(stored) => match stored.into_iter().find(|r| r.id == id) {
                    Some(stored) if stored == local => {}
                    Some(stored) => {
                        tracing::info!("🔄 Reminder '{id}' changed elsewhere; following the stored copy");
                        adopt_locked(&shared, &mut ledger, stored);
                        return;
                    }
                    None => {
                        tracing::info!("🗑️ Reminder '{id}' was deleted elsewhere; not showing it");
                        ledger.records.retain(|r| r.id != id);
                        return;
                    }
                },
                Err(e) => tracing::warn!("⚠️ Cannot re-read reminder '{id}', firing from memory: {e}"),
            }
        }

        let Some(record) = ledger.active_mut(&id) else {
            return;
        };
        record.mark_triggered();
        let fired = record.clone();
        shared.persist(&mut ledger, &fired);
        fired
    };

    tracing::info!("🔔 Reminder due: '{}' ({id})", record.title);
    shared.dispatcher.dispatch(&record).await;
}
