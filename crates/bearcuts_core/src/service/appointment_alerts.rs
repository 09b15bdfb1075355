//! Fixed pre-appointment alerts without a backing reminder record.
//!
//! # Responsibility
//! - Schedule the 24-hour and 2-hour alerts for an appointment.
//! - Cancel both alerts by appointment time.
//!
//! # Invariants
//! - Nothing is persisted; there is no seen-state on this path.
//! - Identifiers derive only from the appointment time, so rescheduling the
//!   same appointment replaces the earlier alerts.

use crate::config::StoreConfig;
use crate::scheduler::{NotificationRequest, NotificationScheduler, ScheduleError};
use log::{info, warn};

const DAY_BEFORE_MS: i64 = 24 * 60 * 60 * 1000;
const TWO_HOURS_BEFORE_MS: i64 = 2 * 60 * 60 * 1000;

/// Per-alert scheduling results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentAlertsOutcome {
    pub day_before: Result<(), ScheduleError>,
    pub two_hours_before: Result<(), ScheduleError>,
}

impl AppointmentAlertsOutcome {
    pub fn all_scheduled(&self) -> bool {
        self.day_before.is_ok() && self.two_hours_before.is_ok()
    }
}

/// Schedules standalone appointment alerts through a notification scheduler.
pub struct AppointmentAlerts<S: NotificationScheduler> {
    scheduler: S,
    brand: String,
}

impl<S: NotificationScheduler> AppointmentAlerts<S> {
    pub fn new(scheduler: S, config: &StoreConfig) -> Self {
        Self {
            scheduler,
            brand: config.brand.clone(),
        }
    }

    /// Schedules both alerts for an appointment at `appointment_ms`.
    ///
    /// Each alert is attempted independently; one failing does not skip the other.
    pub fn schedule(&self, appointment_ms: i64, kind: &str) -> AppointmentAlertsOutcome {
        let day_before = self.scheduler.schedule(&NotificationRequest {
            identifier: day_before_identifier(appointment_ms),
            fire_at_ms: appointment_ms.saturating_sub(DAY_BEFORE_MS),
            title: format!("🐻 {} Reminder", self.brand),
            body: format!("Your {kind} appointment is tomorrow!"),
            payload: None,
        });
        let two_hours_before = self.scheduler.schedule(&NotificationRequest {
            identifier: two_hours_identifier(appointment_ms),
            fire_at_ms: appointment_ms.saturating_sub(TWO_HOURS_BEFORE_MS),
            title: format!("🐻 {} - 2 Hours Left!", self.brand),
            body: format!("Your {kind} appointment is in 2 hours. Don't forget!"),
            payload: None,
        });

        let outcome = AppointmentAlertsOutcome {
            day_before,
            two_hours_before,
        };
        if outcome.all_scheduled() {
            info!(
                "event=appointment_alerts module=alerts status=ok appointment_ms={appointment_ms}"
            );
        } else {
            warn!(
                "event=appointment_alerts module=alerts status=warn appointment_ms={} day_before_ok={} two_hours_ok={}",
                appointment_ms,
                outcome.day_before.is_ok(),
                outcome.two_hours_before.is_ok()
            );
        }
        outcome
    }

    /// Cancels both alerts for the appointment at `appointment_ms`.
    pub fn cancel(&self, appointment_ms: i64) {
        self.scheduler.cancel(&day_before_identifier(appointment_ms));
        self.scheduler.cancel(&two_hours_identifier(appointment_ms));
    }
}

fn day_before_identifier(appointment_ms: i64) -> String {
    format!("appointment-reminder-{}", appointment_ms.div_euclid(1000))
}

fn two_hours_identifier(appointment_ms: i64) -> String {
    format!("appointment-2hour-{}", appointment_ms.div_euclid(1000))
}
