//! # PawCare Notify
//!
//! Local reminder scheduling for the PawCare pet-health app: schedule a
//! reminder, fire it on time, and survive restarts.
//!
//! ## Architecture
//! ```text
//! NotificationScheduler (one tokio timer per pending id)
//!   ├── schedule(id, ...) → cancel same id → persist → arm timer
//!   ├── cancel(id)        → abort timer → isActive = false
//!   ├── initialize()      → past-due: consume silently
//!   │                       future:   re-arm
//!   └── on timer → consume record → Dispatcher
//!                                     ├── PermissionGate (granted?)
//!                                     └── NotificationSurface
//!                                           ├── Terminal
//!                                           └── Webhook (HTTP POST)
//!
//! NotificationStore → KeyValueStorage
//!                       ├── FileStorage   (JSON file per key)
//!                       ├── SqliteStorage (kv_store table)
//!                       └── MemoryStorage
//! ```

pub mod bootstrap;
pub mod dispatch;
pub mod engine;
pub mod permission;
pub mod persistence;
pub mod record;
pub mod reminders;
pub mod storage;
pub mod store;
pub mod surface;
pub mod webhook;

pub use bootstrap::build_scheduler;
pub use dispatch::{ClickAction, DispatchOutcome, Dispatcher};
pub use engine::{NotificationScheduler, RehydrationReport, ScheduleOutcome};
pub use permission::{PermissionGate, PermissionState, StoredPermission};
pub use persistence::SqliteStorage;
pub use record::{NotificationRecord, RecordState};
pub use reminders::{PetReminder, ReminderKind};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, RawStorage};
pub use store::NotificationStore;
pub use surface::{NotificationSurface, RenderOutcome, RenderRequest, TerminalSurface};
pub use webhook::WebhookSurface;
