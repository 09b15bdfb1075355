//! Operator CLI for the on-device reminder store.
//!
//! # Responsibility
//! - Inspect and edit the reminder collection in a Bear Cuts database file.
//! - Simulate alert delivery with an in-process scheduler.
//!
//! Alerts scheduled here live only as long as the process. `deliver`
//! re-derives pending alerts from stored reminders using its own
//! `--lead-minutes`, because the lead chosen at creation is not stored.

use bearcuts_core::config::{env_path, resolve_db_path, LOG_DIR_ENV};
use bearcuts_core::db::open_db;
use bearcuts_core::{
    default_log_level, init_logging, now_epoch_ms, InMemoryScheduler, LeadTime,
    NotificationRequest, NotificationScheduler, NotificationSignal, Reminder, ReminderId,
    ReminderPayload, ReminderStore, SqliteKeyValueStore, StoreConfig,
};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bearcuts")]
#[command(about = "Bear Cuts reminder store CLI")]
#[command(version)]
struct Cli {
    /// Database file; defaults to $BEARCUTS_DB_PATH or the temp directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling logs; defaults to $BEARCUTS_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists reminders, unseen first.
    List,
    /// Adds a reminder for an appointment.
    Add {
        /// Appointment time in epoch milliseconds; must be in the future.
        #[arg(long)]
        at: i64,
        #[arg(long)]
        kind: Option<String>,
        /// Minutes before the appointment to fire the alert.
        #[arg(long, default_value_t = 15)]
        lead_minutes: u32,
    },
    /// Marks a reminder as seen.
    Seen { id: String },
    /// Deletes a reminder.
    Delete { id: String },
    /// Prints reminder alerts due at `--now` and marks them seen.
    ///
    /// Every unseen reminder fires `--lead-minutes` before its appointment,
    /// whatever lead was passed to `add`.
    Deliver {
        /// Delivery time in epoch milliseconds; defaults to the current time.
        #[arg(long)]
        now: Option<i64>,
        /// Lead time applied to every unseen reminder.
        #[arg(long, default_value_t = 15)]
        lead_minutes: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.log_dir.clone());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(log_dir: Option<PathBuf>) {
    let Some(dir) = log_dir.or_else(|| env_path(LOG_DIR_ENV)) else {
        return;
    };
    if let Err(err) = init_logging(default_log_level(), &dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let db_path = cli.db.clone().unwrap_or_else(resolve_db_path);
    let conn =
        open_db(&db_path).map_err(|err| format!("cannot open {}: {err}", db_path.display()))?;
    info!("event=cli_command module=cli status=start");

    let scheduler = InMemoryScheduler::new();
    let mut store = ReminderStore::load(
        SqliteKeyValueStore::new(&conn),
        &scheduler,
        StoreConfig::default(),
    )
    .map_err(|err| err.to_string())?;

    run_store_command(&mut store, &cli.command, cli.json)
}

/// Rejects appointment times that are not after `now_ms`.
fn ensure_future(at_ms: i64, now_ms: i64) -> Result<(), String> {
    if at_ms <= now_ms {
        return Err(format!("--at {at_ms} is not in the future (now is {now_ms})"));
    }
    Ok(())
}

fn run_store_command<S: NotificationScheduler>(
    store: &mut ReminderStore<SqliteKeyValueStore<'_>, S>,
    command: &Command,
    as_json: bool,
) -> Result<(), String> {
    match command {
        Command::List => {
            print_list(store.list(), store.unseen_count(), as_json);
            Ok(())
        }
        Command::Add {
            at,
            kind,
            lead_minutes,
        } => {
            ensure_future(*at, now_epoch_ms())?;
            let kind = kind
                .clone()
                .unwrap_or_else(|| store.config().default_kind.clone());
            let outcome = store
                .create(*at, &kind, LeadTime::from_minutes(*lead_minutes))
                .map_err(|err| err.to_string())?;
            if as_json {
                println!(
                    "{}",
                    json!({
                        "reminder": reminder_json(&outcome.reminder),
                        "scheduled": outcome.is_scheduled(),
                        "warning": outcome.schedule_error.as_ref().map(ToString::to_string),
                    })
                );
            } else {
                println!("added {}", outcome.reminder.id);
                if let Some(err) = &outcome.schedule_error {
                    println!("warning: could not schedule notification: {err}");
                }
            }
            Ok(())
        }
        Command::Seen { id } => {
            let changed = parse_id(id).is_some_and(|id| store.mark_seen(id));
            print_change("seen", id, changed, as_json);
            Ok(())
        }
        Command::Delete { id } => {
            let changed = parse_id(id).is_some_and(|id| store.delete(id));
            print_change("deleted", id, changed, as_json);
            Ok(())
        }
        Command::Deliver { now, lead_minutes } => {
            let now_ms = now.unwrap_or_else(now_epoch_ms);
            deliver(store, now_ms, LeadTime::from_minutes(*lead_minutes), as_json);
            Ok(())
        }
    }
}

fn deliver<S: NotificationScheduler>(
    store: &mut ReminderStore<SqliteKeyValueStore<'_>, S>,
    now_ms: i64,
    lead_time: LeadTime,
    as_json: bool,
) {
    // Alerts from earlier runs are gone with their process; rebuild the
    // queue from unseen records with a clock that accepts any fire time.
    let queue = InMemoryScheduler::at(i64::MIN);
    let lead_ms = i64::from(lead_time.minutes()) * 60 * 1000;
    for reminder in store.list().iter().filter(|reminder| !reminder.is_seen()) {
        let request = NotificationRequest {
            identifier: reminder.id.to_string(),
            fire_at_ms: reminder.scheduled_for_ms.saturating_sub(lead_ms),
            title: store.config().alert_title(),
            body: String::new(),
            payload: Some(ReminderPayload {
                reminder_id: reminder.id,
                scheduled_for_ms: reminder.scheduled_for_ms,
                kind: reminder.kind.clone(),
            }),
        };
        let _ = queue.schedule(&request);
    }

    let delivered: Vec<_> = queue
        .take_due(now_ms)
        .into_iter()
        .filter_map(|request| request.payload)
        .filter_map(|payload| {
            let id = payload.reminder_id;
            store
                .handle_signal(NotificationSignal::Tapped(payload))
                .map(|details| (id, details))
        })
        .collect();

    if as_json {
        let items: Vec<_> = delivered
            .iter()
            .map(|(id, details)| {
                json!({
                    "id": id.to_string(),
                    "title": details.title,
                    "message": details.message,
                    "scheduledFor": details.scheduled_for_ms,
                })
            })
            .collect();
        println!("{}", json!({ "delivered": items }));
    } else if delivered.is_empty() {
        println!("nothing due");
    } else {
        for (id, details) in &delivered {
            println!("{id}  {}  {}", details.title, details.message);
        }
    }
}

fn print_list(reminders: &[Reminder], unseen: usize, as_json: bool) {
    if as_json {
        let items: Vec<_> = reminders.iter().map(reminder_json).collect();
        println!("{}", json!({ "items": items, "unseenCount": unseen }));
        return;
    }
    if reminders.is_empty() {
        println!("no reminders");
        return;
    }
    for reminder in reminders {
        println!(
            "{} {}  {}  at={}  created={}",
            if reminder.is_seen() { "●" } else { "○" },
            reminder.id,
            reminder.title,
            reminder.scheduled_for_ms,
            reminder.created_at_ms()
        );
    }
    println!("{unseen} unseen");
}

fn print_change(verb: &str, id: &str, changed: bool, as_json: bool) {
    if as_json {
        println!("{}", json!({ "id": id, "changed": changed }));
    } else if changed {
        println!("{verb} {id}");
    } else {
        println!("no change for {id}");
    }
}

fn parse_id(raw: &str) -> Option<ReminderId> {
    ReminderId::parse_str(raw.trim()).ok()
}

fn reminder_json(reminder: &Reminder) -> serde_json::Value {
    serde_json::to_value(reminder).unwrap_or_else(|_| json!({ "id": reminder.id.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::{ensure_future, Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_add_with_defaults() {
        let cli = Cli::try_parse_from(["bearcuts", "add", "--at", "1700000000000"]).unwrap();
        match cli.command {
            Command::Add {
                at,
                kind,
                lead_minutes,
            } => {
                assert_eq!(at, 1_700_000_000_000);
                assert!(kind.is_none());
                assert_eq!(lead_minutes, 15);
            }
            _ => panic!("expected add"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn past_or_present_appointment_times_are_rejected() {
        let now = 1_700_000_000_000;
        assert!(ensure_future(now + 1, now).is_ok());
        assert!(ensure_future(now, now).is_err());
        let err = ensure_future(now - 60_000, now).unwrap_err();
        assert!(err.contains("not in the future"));
    }

    #[test]
    fn deliver_parses_its_own_lead_time() {
        let cli = Cli::try_parse_from(["bearcuts", "deliver", "--lead-minutes", "120"]).unwrap();
        match cli.command {
            Command::Deliver { now, lead_minutes } => {
                assert!(now.is_none());
                assert_eq!(lead_minutes, 120);
            }
            _ => panic!("expected deliver"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["bearcuts", "list", "--json", "--db", "/tmp/x.sqlite3"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/x.sqlite3")));
    }
}
