//! Core domain logic for the Bear Cuts app.
//! This crate is the single source of truth for reminder lifecycle rules.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod service;

pub use config::StoreConfig;
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::reminder::{
    now_epoch_ms, sort_reminders, LeadTime, Reminder, ReminderId, ReminderValidationError,
};
pub use scheduler::{
    InMemoryScheduler, NotificationCommand, NotificationRequest, NotificationScheduler,
    OutboxScheduler, ReminderPayload, ScheduleError,
};
pub use service::appointment_alerts::{AppointmentAlerts, AppointmentAlertsOutcome};
pub use service::reminder_store::{CreateOutcome, ReminderError, ReminderResult, ReminderStore};
pub use service::signals::{NotificationSignal, ReminderDetails};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
