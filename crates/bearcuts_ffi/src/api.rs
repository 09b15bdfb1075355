//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose reminder list/create/seen/delete use-cases to Dart via FRB.
//! - Hand notification schedule/cancel commands to the host, which owns the
//!   OS notification center.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each mutating call runs load-mutate-persist under one process-wide lock.
//! - Unparsable reminder IDs behave like unknown IDs (no-op, `ok = true`).

use bearcuts_core::config::resolve_db_path;
use bearcuts_core::db::open_db;
use bearcuts_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppointmentAlerts, LeadTime, NotificationCommand, NotificationSignal, OutboxScheduler,
    Reminder, ReminderId, ReminderPayload, ReminderStore, SqliteKeyValueStore, StoreConfig,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

type FfiStore<'conn, 'outbox> = ReminderStore<SqliteKeyValueStore<'conn>, &'outbox OutboxScheduler>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One reminder row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub id: String,
    pub title: String,
    pub kind: String,
    /// Appointment time in epoch milliseconds.
    pub scheduled_for_ms: i64,
    pub created_at_ms: i64,
    pub seen: bool,
}

/// Sorted reminder list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderListResponse {
    /// `false` when storage could not be read; `items` is then not authoritative.
    pub ok: bool,
    /// Unseen first, then latest appointment first.
    pub items: Vec<ReminderItem>,
    /// Badge count.
    pub unseen_count: u32,
    pub message: String,
}

/// Notification instruction the host must apply to the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCommandItem {
    /// `schedule` or `cancel`.
    pub op: String,
    pub identifier: String,
    pub fire_at_ms: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    /// JSON user-info for reminder alerts (`reminderId`, `appointmentDate`,
    /// `appointmentType`).
    pub payload_json: Option<String>,
}

/// Generic action envelope for reminder mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    /// Whether the operation completed. Unknown IDs still count as success.
    pub ok: bool,
    /// Whether stored state changed.
    pub changed: bool,
    pub reminder_id: Option<String>,
    /// Non-fatal problem, e.g. the alert could not be scheduled.
    pub warning: Option<String>,
    pub message: String,
    pub commands: Vec<NotificationCommandItem>,
}

impl ReminderActionResponse {
    fn success(
        message: impl Into<String>,
        changed: bool,
        reminder_id: Option<String>,
        commands: Vec<NotificationCommand>,
    ) -> Self {
        Self {
            ok: true,
            changed,
            reminder_id,
            warning: None,
            message: message.into(),
            commands: commands.into_iter().map(to_command_item).collect(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            reminder_id: None,
            warning: None,
            message: message.into(),
            commands: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// Detail envelope for a tapped reminder alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTapResponse {
    pub ok: bool,
    pub title: String,
    pub message: String,
    pub scheduled_for_ms: i64,
    pub newly_seen: bool,
}

/// Lists reminders in display order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; DB and read failures yield `ok = false` with a diagnostic message.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_list() -> ReminderListResponse {
    match with_store(|store| {
        (
            store.list().iter().map(to_reminder_item).collect::<Vec<_>>(),
            store.unseen_count(),
        )
    }) {
        Ok(((items, unseen), _)) => {
            let message = if items.is_empty() {
                "No reminders.".to_string()
            } else {
                format!("{} reminder(s).", items.len())
            };
            ReminderListResponse {
                ok: true,
                items,
                unseen_count: u32::try_from(unseen).unwrap_or(u32::MAX),
                message,
            }
        }
        Err(err) => ReminderListResponse {
            ok: false,
            items: Vec::new(),
            unseen_count: 0,
            message: format!("reminders_list failed: {err}"),
        },
    }
}

/// Creates a reminder and its alert.
///
/// Input semantics:
/// - `scheduled_for_ms`: appointment time; the UI only offers future times.
/// - `kind`: category; blank uses the configured default.
/// - `lead_minutes`: minutes before the appointment; `None` uses 15.
///
/// # FFI contract
/// - A refused alert is returned as `warning`; the reminder is still created.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_create(
    scheduled_for_ms: i64,
    kind: String,
    lead_minutes: Option<u32>,
) -> ReminderActionResponse {
    let lead_time = lead_minutes.map_or(LeadTime::default(), LeadTime::from_minutes);
    let result = with_store(|store| {
        let kind = if kind.trim().is_empty() {
            store.config().default_kind.clone()
        } else {
            kind.trim().to_string()
        };
        store.create(scheduled_for_ms, &kind, lead_time)
    });

    match result {
        Ok((Ok(outcome), commands)) => ReminderActionResponse::success(
            "Reminder added.",
            true,
            Some(outcome.reminder.id.to_string()),
            commands,
        )
        .with_warning(
            outcome
                .schedule_error
                .map(|err| format!("Could not schedule reminder notification: {err}")),
        ),
        Ok((Err(err), _)) => {
            ReminderActionResponse::failure(format!("reminder_create failed: {err}"))
        }
        Err(err) => ReminderActionResponse::failure(format!("reminder_create failed: {err}")),
    }
}

/// Marks a reminder seen. Safe to call repeatedly and for deleted IDs.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_mark_seen(reminder_id: String) -> ReminderActionResponse {
    let Some(id) = parse_reminder_id(&reminder_id) else {
        return ReminderActionResponse::success("Reminder not found.", false, None, Vec::new());
    };
    match with_store(|store| store.mark_seen(id)) {
        Ok((changed, commands)) => ReminderActionResponse::success(
            if changed {
                "Reminder marked as seen."
            } else {
                "Reminder unchanged."
            },
            changed,
            Some(id.to_string()),
            commands,
        ),
        Err(err) => ReminderActionResponse::failure(format!("reminder_mark_seen failed: {err}")),
    }
}

/// Deletes a reminder; the response carries the matching cancel command.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete(reminder_id: String) -> ReminderActionResponse {
    let Some(id) = parse_reminder_id(&reminder_id) else {
        return ReminderActionResponse::success("Reminder not found.", false, None, Vec::new());
    };
    match with_store(|store| store.delete(id)) {
        Ok((changed, commands)) => ReminderActionResponse::success(
            if changed {
                "Reminder deleted."
            } else {
                "Reminder not found."
            },
            changed,
            Some(id.to_string()),
            commands,
        ),
        Err(err) => ReminderActionResponse::failure(format!("reminder_delete failed: {err}")),
    }
}

/// Handles a tapped reminder alert using the delivered user-info fields.
///
/// # FFI contract
/// - Marks the reminder seen when it still exists.
/// - Returns detail text even for deleted reminders.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_notification_tapped(
    reminder_id: String,
    scheduled_for_ms: i64,
    kind: String,
) -> ReminderTapResponse {
    let Some(id) = parse_reminder_id(&reminder_id) else {
        return ReminderTapResponse {
            ok: false,
            title: String::new(),
            message: format!("invalid reminder id `{reminder_id}`"),
            scheduled_for_ms,
            newly_seen: false,
        };
    };
    let signal = NotificationSignal::Tapped(ReminderPayload {
        reminder_id: id,
        scheduled_for_ms,
        kind,
    });

    match with_store(|store| store.handle_signal(signal)) {
        Ok((Some(details), _)) => ReminderTapResponse {
            ok: true,
            title: details.title,
            message: details.message,
            scheduled_for_ms: details.scheduled_for_ms,
            newly_seen: details.newly_seen,
        },
        Ok((None, _)) => ReminderTapResponse {
            ok: false,
            title: String::new(),
            message: "tap produced no details".to_string(),
            scheduled_for_ms,
            newly_seen: false,
        },
        Err(err) => ReminderTapResponse {
            ok: false,
            title: String::new(),
            message: format!("reminder_notification_tapped failed: {err}"),
            scheduled_for_ms,
            newly_seen: false,
        },
    }
}

/// Builds the 24-hour and 2-hour appointment alerts.
///
/// # FFI contract
/// - Nothing is persisted; only commands are returned.
/// - Alerts whose fire time already passed are skipped and reported as `warning`.
#[flutter_rust_bridge::frb(sync)]
pub fn appointment_alerts_schedule(appointment_ms: i64, kind: String) -> ReminderActionResponse {
    let outbox = OutboxScheduler::new();
    let config = StoreConfig::default();
    let kind = if kind.trim().is_empty() {
        config.default_kind.clone()
    } else {
        kind.trim().to_string()
    };
    let outcome = AppointmentAlerts::new(&outbox, &config).schedule(appointment_ms, &kind);

    let warning = [outcome.day_before.as_ref(), outcome.two_hours_before.as_ref()]
        .into_iter()
        .filter_map(|result| result.err().map(ToString::to_string))
        .collect::<Vec<_>>();
    ReminderActionResponse::success("Appointment alerts prepared.", false, None, outbox.drain())
        .with_warning((!warning.is_empty()).then(|| warning.join("; ")))
}

fn with_store<T>(
    f: impl FnOnce(&mut FfiStore<'_, '_>) -> T,
) -> Result<(T, Vec<NotificationCommand>), String> {
    let _guard = STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let conn = open_db(resolve_db_path_cached()).map_err(|err| format!("DB open failed: {err}"))?;
    let outbox = OutboxScheduler::new();
    let mut store = ReminderStore::load(
        SqliteKeyValueStore::new(&conn),
        &outbox,
        StoreConfig::default(),
    )
    .map_err(|err| format!("Reminder load failed: {err}"))?;
    let value = f(&mut store);
    drop(store);
    Ok((value, outbox.drain()))
}

fn resolve_db_path_cached() -> PathBuf {
    DB_PATH.get_or_init(resolve_db_path).clone()
}

fn parse_reminder_id(raw: &str) -> Option<ReminderId> {
    match ReminderId::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("event=ffi_parse_id module=ffi status=warn error_code=invalid_reminder_id");
            None
        }
    }
}

fn to_reminder_item(reminder: &Reminder) -> ReminderItem {
    ReminderItem {
        id: reminder.id.to_string(),
        title: reminder.title.clone(),
        kind: reminder.kind.clone(),
        scheduled_for_ms: reminder.scheduled_for_ms,
        created_at_ms: reminder.created_at_ms(),
        seen: reminder.is_seen(),
    }
}

fn to_command_item(command: NotificationCommand) -> NotificationCommandItem {
    match command {
        NotificationCommand::Schedule(request) => NotificationCommandItem {
            op: "schedule".to_string(),
            identifier: request.identifier,
            fire_at_ms: Some(request.fire_at_ms),
            title: Some(request.title),
            body: Some(request.body),
            payload_json: request
                .payload
                .and_then(|payload| payload.to_json().ok()),
        },
        NotificationCommand::Cancel { identifier } => NotificationCommandItem {
            op: "cancel".to_string(),
            identifier,
            fire_at_ms: None,
            title: None,
            body: None,
            payload_json: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{
        appointment_alerts_schedule, core_version, init_logging, ping, reminder_create,
        reminder_delete, reminder_mark_seen, reminder_notification_tapped, reminders_list,
    };
    use bearcuts_core::now_epoch_ms;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn create_returns_schedule_command_and_lists_unseen_reminder() {
        let appointment = now_epoch_ms() + 24 * HOUR_MS;
        let created = reminder_create(appointment, "Hair Styles".to_string(), Some(30));
        assert!(created.ok, "{}", created.message);
        assert!(created.warning.is_none());
        let id = created.reminder_id.clone().expect("create returns id");

        assert_eq!(created.commands.len(), 1);
        let command = &created.commands[0];
        assert_eq!(command.op, "schedule");
        assert_eq!(command.identifier, id);
        assert_eq!(command.fire_at_ms, Some(appointment - HOUR_MS / 2));
        assert!(command
            .payload_json
            .as_deref()
            .is_some_and(|json| json.contains(&id)));

        let listed = reminders_list();
        assert!(listed.ok);
        let item = listed
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("created reminder is listed");
        assert!(!item.seen);
        assert_eq!(item.title, "Bear Cuts - Hair Styles");
    }

    #[test]
    fn create_with_past_fire_time_warns_but_keeps_record() {
        let appointment = now_epoch_ms() + 60_000;
        let created = reminder_create(appointment, String::new(), Some(120));
        assert!(created.ok, "{}", created.message);
        assert!(created.warning.is_some());
        assert!(created.commands.is_empty());
        let id = created.reminder_id.expect("create returns id");

        let listed = reminders_list();
        let item = listed.items.iter().find(|item| item.id == id).unwrap();
        assert_eq!(item.kind, "Hair Styles");
    }

    #[test]
    fn mark_seen_and_delete_round_trip() {
        let created = reminder_create(
            now_epoch_ms() + 48 * HOUR_MS,
            "Hair Styles".to_string(),
            None,
        );
        let id = created.reminder_id.expect("create returns id");

        let first = reminder_mark_seen(id.clone());
        assert!(first.ok && first.changed);
        let second = reminder_mark_seen(id.clone());
        assert!(second.ok && !second.changed);

        let deleted = reminder_delete(id.clone());
        assert!(deleted.ok && deleted.changed);
        assert_eq!(deleted.commands.len(), 1);
        assert_eq!(deleted.commands[0].op, "cancel");
        assert_eq!(deleted.commands[0].identifier, id);

        let again = reminder_delete(id.clone());
        assert!(again.ok && !again.changed);
        assert!(again.commands.is_empty());
        assert!(reminders_list().items.iter().all(|item| item.id != id));
    }

    #[test]
    fn invalid_ids_are_noops() {
        let seen = reminder_mark_seen("not-a-uuid".to_string());
        assert!(seen.ok && !seen.changed);
        let deleted = reminder_delete("not-a-uuid".to_string());
        assert!(deleted.ok && !deleted.changed);
    }

    #[test]
    fn tap_marks_seen_and_returns_details() {
        let appointment = now_epoch_ms() + 72 * HOUR_MS;
        let created = reminder_create(appointment, "Hair Styles".to_string(), Some(5));
        let id = created.reminder_id.expect("create returns id");

        let tap = reminder_notification_tapped(id.clone(), appointment, "Hair Styles".to_string());
        assert!(tap.ok, "{}", tap.message);
        assert!(tap.newly_seen);
        assert!(tap.message.contains("Hair Styles"));

        let listed = reminders_list();
        assert!(listed.items.iter().any(|item| item.id == id && item.seen));
    }

    #[test]
    fn appointment_alerts_return_two_schedule_commands() {
        let appointment = now_epoch_ms() + 72 * HOUR_MS;
        let response = appointment_alerts_schedule(appointment, "Hair Styles".to_string());
        assert!(response.ok);
        assert!(response.warning.is_none());
        assert_eq!(response.commands.len(), 2);
        assert!(response.commands.iter().all(|command| command.op == "schedule"));
        assert!(response.commands[0]
            .identifier
            .starts_with("appointment-reminder-"));
        assert!(response.commands[1].identifier.starts_with("appointment-2hour-"));
    }
}
