//! # PawCare: pet-care reminders from the terminal
//!
//! Usage:
//!   pawcare remind walk --pet Bo --in-secs 1800     # Walk reminder in 30 minutes
//!   pawcare schedule --id med-1 --title Medication --body "Evening dose" --at 2026-10-16T19:00:00Z
//!   pawcare list --all                              # Every record, fired and cancelled too
//!   pawcare permission request                      # Allow reminders to be shown
//!   pawcare run                                     # Re-arm saved reminders and deliver them

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use pawcare_core::PawcareConfig;
use pawcare_notify::{
    NotificationRecord, NotificationScheduler, PermissionState, PetReminder, ReminderKind,
    ScheduleOutcome, StoredPermission,
};
use tracing_subscriber::EnvFilter;

const SYNC_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "pawcare", version, about = "🐾 PawCare: pet-care reminders")]
struct Cli {
    /// Config file (default: ~/.pawcare/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule a custom reminder
    Schedule {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[command(flatten)]
        when: When,
        /// Page to open when the notification is clicked
        #[arg(long)]
        url: Option<String>,
    },
    /// Schedule a pet-care reminder (walk, feed, water, weight, health-check, medication)
    Remind {
        kind: ReminderKind,
        #[arg(long)]
        pet: String,
        #[command(flatten)]
        when: When,
        #[arg(long)]
        note: Option<String>,
    },
    /// Cancel a pending reminder
    Cancel { id: String },
    /// List reminders
    List {
        /// Include fired and cancelled reminders
        #[arg(long)]
        all: bool,
    },
    /// Show or change notification permission
    Permission {
        #[arg(value_enum, default_value = "status")]
        action: PermissionAction,
    },
    /// Re-arm saved reminders and deliver them until Ctrl+C
    Run {
        /// Exit once no reminder is pending
        #[arg(long)]
        exit_when_idle: bool,
    },
    /// Delete every saved reminder
    Clear,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct When {
    /// Fire time, RFC 3339 (e.g. 2026-10-16T19:00:00+02:00)
    #[arg(long)]
    at: Option<String>,
    /// Fire this many seconds from now
    #[arg(long)]
    in_secs: Option<u64>,
}

impl When {
    fn resolve(&self) -> Result<DateTime<Utc>> {
        match (&self.at, self.in_secs) {
            (Some(at), _) => Ok(DateTime::parse_from_rfc3339(at)
                .with_context(|| format!("invalid --at '{at}'"))?
                .with_timezone(&Utc)),
            (None, Some(secs)) => i64::try_from(secs)
                .ok()
                .and_then(chrono::TimeDelta::try_seconds)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .with_context(|| format!("--in-secs {secs} is too far in the future")),
            (None, None) => anyhow::bail!("either --at or --in-secs is required"),
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PermissionAction {
    Status,
    Request,
    Deny,
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "pawcare=debug,pawcare_notify=debug"
    } else {
        "pawcare=info,pawcare_notify=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PawcareConfig::load_from(&expand_path(path))?,
        None => PawcareConfig::load()?,
    };
    let scheduler = pawcare_notify::build_scheduler(&config)?;

    match cli.command {
        Command::Schedule { id, title, body, when, url } => {
            let at = when.resolve()?;
            let outcome = scheduler.schedule(&id, &title, &body, at, url.as_deref()).await;
            report_schedule(&id, at, &outcome);
        }
        Command::Remind { kind, pet, when, note } => {
            let at = when.resolve()?;
            let mut reminder = PetReminder::new(kind, &pet);
            if let Some(note) = note {
                reminder = reminder.with_note(&note);
            }
            let outcome = reminder.schedule(&scheduler, at).await;
            report_schedule(&reminder.id(), at, &outcome);
        }
        Command::Cancel { id } => {
            if scheduler.cancel(&id).await {
                println!("🗑️  Cancelled '{id}'");
            } else {
                println!("⚠️  No pending reminder '{id}'");
            }
        }
        Command::List { all } => {
            let records = if all {
                scheduler.list_all().await
            } else {
                scheduler.list_active().await
            };
            print_records(&records);
        }
        Command::Permission { action } => {
            permission_command(&scheduler, action).await;
        }
        Command::Run { exit_when_idle } => {
            run(&scheduler, exit_when_idle).await?;
        }
        Command::Clear => {
            scheduler.clear_all().await;
            println!("🧹 All reminders deleted");
        }
    }

    // Pending timers die with this process; `pawcare run` re-arms them.
    scheduler.shutdown().await;
    Ok(())
}

fn expand_path(p: &std::path::Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).to_string())
}

fn report_schedule(id: &str, at: DateTime<Utc>, outcome: &ScheduleOutcome) {
    match outcome {
        ScheduleOutcome::Armed { delay } => {
            println!(
                "📅 '{id}' saved for {} (in {}s). Keep `pawcare run` going to receive it.",
                at.to_rfc3339(),
                delay.as_secs()
            );
        }
        ScheduleOutcome::PastSchedule => println!("⚠️  {} is not in the future; nothing scheduled", at.to_rfc3339()),
        ScheduleOutcome::CapabilityUnavailable => {
            println!("⚠️  The configured surface cannot show notifications; nothing scheduled")
        }
    }
}

fn print_records(records: &[NotificationRecord]) {
    if records.is_empty() {
        println!("No reminders.");
        return;
    }
    for record in records {
        println!(
            "{:<28} {:<10} {}  {}",
            record.id,
            record.state().to_string(),
            record.scheduled_time.format("%Y-%m-%d %H:%M:%S UTC"),
            record.title
        );
    }
}

async fn permission_command(scheduler: &NotificationScheduler, action: PermissionAction) {
    let stored = StoredPermission::new(scheduler.store().storage());
    match action {
        PermissionAction::Status => {}
        PermissionAction::Request => {
            if !scheduler.request_permission().await {
                println!("⚠️  Permission not granted");
            }
        }
        PermissionAction::Deny => {
            if !stored.set(PermissionState::Denied) {
                println!("⚠️  Could not save the denial");
            }
        }
        PermissionAction::Reset => stored.reset(),
    }
    println!("🔔 Notification permission: {}", scheduler.permission());
}

async fn run(scheduler: &NotificationScheduler, exit_when_idle: bool) -> Result<()> {
    let report = scheduler.initialize().await;
    println!(
        "⏰ {} reminder(s) armed, {} missed while offline",
        report.rearmed, report.expired
    );
    match scheduler.permission() {
        PermissionState::Granted => {}
        PermissionState::Default => {
            println!("ℹ️  Reminders will be silent until you run `pawcare permission request`")
        }
        other => println!("ℹ️  Notification permission is {other}; reminders will be silent"),
    }

    // Other commands write the same store; merge their changes.
    let mut interval = tokio::time::interval(SYNC_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                scheduler.sync_from_store().await;
                if exit_when_idle && scheduler.armed_count().await == 0 {
                    // Let the last dispatch finish rendering.
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    break;
                }
            }
            res = &mut ctrl_c => {
                res?;
                break;
            }
        }
    }

    let stopped = scheduler.shutdown().await;
    tracing::info!("👋 Stopped {stopped} pending timer(s); they resume on the next run");
    Ok(())
}
