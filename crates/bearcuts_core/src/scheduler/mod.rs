//! Notification scheduler contracts.
//!
//! # Responsibility
//! - Describe fire-once alerts handed to the OS notification facility.
//! - Define the payload that lets a delivered alert be correlated back to
//!   its reminder record.
//!
//! # Invariants
//! - A request identifier is unique among pending requests; scheduling the
//!   same identifier again replaces the earlier request.
//! - `cancel` on an unknown identifier is a no-op.

use crate::model::reminder::ReminderId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod outbox;

pub use memory::InMemoryScheduler;
pub use outbox::{NotificationCommand, OutboxScheduler};

/// Data carried by a reminder alert so a tap can be routed back to core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub reminder_id: ReminderId,
    #[serde(rename = "appointmentDate")]
    pub scheduled_for_ms: i64,
    #[serde(rename = "appointmentType")]
    pub kind: String,
}

impl ReminderPayload {
    /// Serializes to the user-info JSON attached to platform alerts.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One fire-once alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    /// Fire time, Unix epoch milliseconds.
    pub fire_at_ms: i64,
    pub title: String,
    pub body: String,
    /// Present for reminder-backed alerts; absent for standalone alerts.
    pub payload: Option<ReminderPayload>,
}

/// Scheduling rejection reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    EmptyIdentifier,
    FireTimeInPast { fire_at_ms: i64, now_ms: i64 },
    /// The platform refused the request (permissions, quota, ...).
    Rejected(String),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentifier => write!(f, "notification identifier cannot be empty"),
            Self::FireTimeInPast { fire_at_ms, now_ms } => write!(
                f,
                "notification fire time {fire_at_ms} is before now {now_ms}"
            ),
            Self::Rejected(reason) => write!(f, "notification rejected: {reason}"),
        }
    }
}

impl Error for ScheduleError {}

/// OS-level fire-once notification facility.
pub trait NotificationScheduler {
    fn schedule(&self, request: &NotificationRequest) -> Result<(), ScheduleError>;
    fn cancel(&self, identifier: &str);
}

impl<T: NotificationScheduler + ?Sized> NotificationScheduler for &T {
    fn schedule(&self, request: &NotificationRequest) -> Result<(), ScheduleError> {
        (**self).schedule(request)
    }

    fn cancel(&self, identifier: &str) {
        (**self).cancel(identifier)
    }
}

/// Shared admission checks for local scheduler implementations.
pub(crate) fn check_request(
    request: &NotificationRequest,
    now_ms: i64,
) -> Result<(), ScheduleError> {
    if request.identifier.trim().is_empty() {
        return Err(ScheduleError::EmptyIdentifier);
    }
    if request.fire_at_ms < now_ms {
        return Err(ScheduleError::FireTimeInPast {
            fire_at_ms: request.fire_at_ms,
            now_ms,
        });
    }
    Ok(())
}

/// Clock used by local schedulers: pinned for tests, wall-clock otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) enum SchedulerClock {
    #[default]
    System,
    Fixed(i64),
}

impl SchedulerClock {
    pub(crate) fn now_ms(self) -> i64 {
        match self {
            Self::System => crate::model::reminder::now_epoch_ms(),
            Self::Fixed(now_ms) => now_ms,
        }
    }
}
