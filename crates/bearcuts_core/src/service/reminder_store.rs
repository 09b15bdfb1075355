//! Reminder lifecycle store.
//!
//! # Responsibility
//! - Own the authoritative in-memory reminder collection.
//! - Persist the full collection as one JSON blob after every mutation.
//! - Keep each record's scheduled alert consistent with its existence.
//!
//! # Invariants
//! - The collection is sorted by `display_order` after every mutation.
//! - Reminder IDs are unique within the collection.
//! - `mark_seen` and `delete` are idempotent; unknown IDs are no-ops.
//! - A scheduling failure never rolls back a created record.
//! - A persistence failure never rolls back in-memory state.
//! - A failed read never yields a store, so it can never overwrite saved data.

use crate::config::StoreConfig;
use crate::kv::{KeyValueStore, KvError, KvResult};
use crate::model::reminder::{
    sort_reminders, LeadTime, Reminder, ReminderId, ReminderValidationError,
};
use crate::scheduler::{
    NotificationRequest, NotificationScheduler, ReminderPayload, ScheduleError,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type ReminderResult<T> = Result<T, ReminderError>;

/// Errors surfaced by reminder store operations.
#[derive(Debug)]
pub enum ReminderError {
    Validation(ReminderValidationError),
    /// The persisted collection could not be read.
    Storage(KvError),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "reminder storage unavailable: {err}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ReminderValidationError> for ReminderError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<KvError> for ReminderError {
    fn from(value: KvError) -> Self {
        Self::Storage(value)
    }
}

/// Result of creating a reminder.
///
/// The record is always persisted; `schedule_error` carries the
/// warning-level outcome of the alert request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub reminder: Reminder,
    pub schedule_error: Option<ScheduleError>,
}

impl CreateOutcome {
    pub fn is_scheduled(&self) -> bool {
        self.schedule_error.is_none()
    }
}

/// Sorted, persisted reminder collection paired with scheduled alerts.
pub struct ReminderStore<K: KeyValueStore, S: NotificationScheduler> {
    kv: K,
    scheduler: S,
    config: StoreConfig,
    reminders: Vec<Reminder>,
}

impl<K: KeyValueStore, S: NotificationScheduler> ReminderStore<K, S> {
    /// Loads the persisted collection, or starts empty.
    ///
    /// Missing and undecodable blobs fall back to an empty list.
    /// Individually invalid records are dropped.
    ///
    /// # Errors
    /// - `Storage` when the backend read fails. No store is returned, so the
    ///   saved collection is left untouched.
    pub fn load(kv: K, scheduler: S, config: StoreConfig) -> ReminderResult<Self> {
        let reminders = read_collection(&kv, &config.storage_key)?;
        let mut store = Self {
            kv,
            scheduler,
            config,
            reminders,
        };
        sort_reminders(&mut store.reminders);
        info!(
            "event=reminder_load module=reminder status=ok count={}",
            store.reminders.len()
        );
        Ok(store)
    }

    /// Creates, persists and schedules a reminder for `kind` at `scheduled_for_ms`.
    ///
    /// `scheduled_for_ms` is expected to be in the future; callers enforce that.
    ///
    /// # Errors
    /// - `Validation` when `kind` is blank or the time is negative. Nothing is
    ///   stored or scheduled in that case.
    pub fn create(
        &mut self,
        scheduled_for_ms: i64,
        kind: &str,
        lead_time: impl Into<Duration>,
    ) -> ReminderResult<CreateOutcome> {
        let kind = kind.trim();
        let lead_time = lead_time.into();
        let reminder = Reminder::new(
            self.config.reminder_title(kind),
            scheduled_for_ms,
            kind,
        );
        reminder.validate()?;

        self.reminders.push(reminder.clone());
        sort_reminders(&mut self.reminders);
        self.persist("reminder_create");

        let request = self.reminder_request(&reminder, lead_time);
        let schedule_error = match self.scheduler.schedule(&request) {
            Ok(()) => {
                info!(
                    "event=reminder_create module=reminder status=ok reminder_id={} fire_at_ms={}",
                    reminder.id, request.fire_at_ms
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=reminder_create module=reminder status=warn reminder_id={} error_code=schedule_failed error={}",
                    reminder.id, err
                );
                Some(err)
            }
        };

        Ok(CreateOutcome {
            reminder,
            schedule_error,
        })
    }

    /// Creates a reminder using the configured default category.
    pub fn create_default(
        &mut self,
        scheduled_for_ms: i64,
        lead_time: LeadTime,
    ) -> ReminderResult<CreateOutcome> {
        let kind = self.config.default_kind.clone();
        self.create(scheduled_for_ms, &kind, lead_time)
    }

    /// Flags a reminder as seen.
    ///
    /// Returns `true` when the record existed and was unseen. Unknown and
    /// already-seen IDs are no-ops.
    pub fn mark_seen(&mut self, id: ReminderId) -> bool {
        let Some(reminder) = self.reminders.iter_mut().find(|r| r.id == id) else {
            debug!(
                "event=reminder_mark_seen module=reminder status=skip reason=not_found reminder_id={id}"
            );
            return false;
        };
        if !reminder.mark_seen() {
            debug!(
                "event=reminder_mark_seen module=reminder status=skip reason=already_seen reminder_id={id}"
            );
            return false;
        }

        sort_reminders(&mut self.reminders);
        self.persist("reminder_mark_seen");
        info!("event=reminder_mark_seen module=reminder status=ok reminder_id={id}");
        true
    }

    /// Removes a reminder and cancels its pending alert.
    ///
    /// Returns `true` when a record was removed. Unknown IDs are no-ops and
    /// trigger neither a write nor a cancel.
    pub fn delete(&mut self, id: ReminderId) -> bool {
        let Some(index) = self.reminders.iter().position(|r| r.id == id) else {
            debug!(
                "event=reminder_delete module=reminder status=skip reason=not_found reminder_id={id}"
            );
            return false;
        };

        self.reminders.remove(index);
        self.persist("reminder_delete");
        self.scheduler.cancel(&id.to_string());
        info!("event=reminder_delete module=reminder status=ok reminder_id={id}");
        true
    }

    /// Current collection in display order.
    pub fn list(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    /// Number of reminders not yet seen; drives the app badge.
    pub fn unseen_count(&self) -> usize {
        self.reminders.iter().filter(|r| !r.is_seen()).count()
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn reminder_request(&self, reminder: &Reminder, lead_time: Duration) -> NotificationRequest {
        let lead_ms = i64::try_from(lead_time.as_millis()).unwrap_or(i64::MAX);
        let lead_minutes = u32::try_from(lead_time.as_secs() / 60).unwrap_or(u32::MAX);
        NotificationRequest {
            identifier: reminder.id.to_string(),
            fire_at_ms: reminder.scheduled_for_ms.saturating_sub(lead_ms),
            title: self.config.alert_title(),
            body: format!(
                "Your {} appointment is coming up in {}!",
                reminder.kind,
                LeadTime::from_minutes(lead_minutes).label()
            ),
            payload: Some(ReminderPayload {
                reminder_id: reminder.id,
                scheduled_for_ms: reminder.scheduled_for_ms,
                kind: reminder.kind.clone(),
            }),
        }
    }

    fn persist(&self, event: &'static str) {
        let bytes = match serde_json::to_vec(&self.reminders) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(
                    "event={event} module=reminder status=error error_code=encode_failed error={err}"
                );
                return;
            }
        };

        if let Err(err) = self.kv.set(&self.config.storage_key, &bytes) {
            error!(
                "event={event} module=reminder status=error error_code=persist_failed count={} error={err}",
                self.reminders.len()
            );
        }
    }
}

fn read_collection(kv: &impl KeyValueStore, key: &str) -> KvResult<Vec<Reminder>> {
    let bytes = match kv.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(Vec::new()),
        Err(err) => {
            error!(
                "event=reminder_load module=reminder status=error error_code=read_failed error={err}"
            );
            return Err(err);
        }
    };

    let raw: Vec<Reminder> = match serde_json::from_slice(&bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(
                "event=reminder_load module=reminder status=warn error_code=decode_failed error={err}"
            );
            return Ok(Vec::new());
        }
    };

    let mut reminders: Vec<Reminder> = Vec::with_capacity(raw.len());
    for reminder in raw {
        if let Err(err) = reminder.validate() {
            warn!(
                "event=reminder_load module=reminder status=warn error_code=invalid_record reminder_id={} error={err}",
                reminder.id
            );
            continue;
        }
        if reminders.iter().any(|kept| kept.id == reminder.id) {
            warn!(
                "event=reminder_load module=reminder status=warn error_code=duplicate_id reminder_id={}",
                reminder.id
            );
            continue;
        }
        reminders.push(reminder);
    }
    Ok(reminders)
}
