//! Reminder domain model.
//!
//! # Responsibility
//! - Define the persisted appointment reminder record.
//! - Own the seen-state transition and list ordering rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another reminder.
//! - `created_at_ms` is fixed at construction and has no setter.
//! - `seen` only moves from `false` to `true`.
//! - Lists are ordered unseen-first, then by `scheduled_for_ms` descending.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a reminder record.
///
/// The string form doubles as the notification scheduler request identifier.
pub type ReminderId = Uuid;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const APPLE_REFERENCE_EPOCH_SECS: i64 = 978_307_200;

/// Persisted appointment reminder.
///
/// Written with epoch-millisecond `scheduledFor`/`createdAt`. Records saved
/// by the iOS app (`date`/`createdAt` as seconds since 2001) still load and
/// are rewritten in the current shape on the next save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredReminder")]
pub struct Reminder {
    pub id: ReminderId,
    /// Display title fixed at creation, e.g. `Bear Cuts - Hair Styles`.
    pub title: String,
    /// Appointment time, Unix epoch milliseconds.
    #[serde(rename = "scheduledFor")]
    pub scheduled_for_ms: i64,
    /// Category tag. Only one category exists today.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "createdAt")]
    created_at_ms: i64,
    #[serde(rename = "isSeen")]
    seen: bool,
}

/// Accepted on-disk record shapes, tried in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredReminder {
    Current {
        id: ReminderId,
        title: String,
        #[serde(rename = "scheduledFor")]
        scheduled_for_ms: i64,
        #[serde(rename = "type")]
        kind: String,
        #[serde(rename = "createdAt")]
        created_at_ms: i64,
        #[serde(rename = "isSeen")]
        seen: bool,
    },
    /// Foundation `Date` values in their default `Codable` encoding.
    AppleReferenceDate {
        id: ReminderId,
        title: String,
        date: f64,
        #[serde(rename = "type")]
        kind: String,
        #[serde(rename = "createdAt")]
        created_at: f64,
        #[serde(rename = "isSeen")]
        seen: bool,
    },
}

impl From<StoredReminder> for Reminder {
    fn from(value: StoredReminder) -> Self {
        match value {
            StoredReminder::Current {
                id,
                title,
                scheduled_for_ms,
                kind,
                created_at_ms,
                seen,
            } => Self {
                id,
                title,
                scheduled_for_ms,
                kind,
                created_at_ms,
                seen,
            },
            StoredReminder::AppleReferenceDate {
                id,
                title,
                date,
                kind,
                created_at,
                seen,
            } => Self {
                id,
                title,
                scheduled_for_ms: apple_reference_secs_to_epoch_ms(date),
                kind,
                created_at_ms: apple_reference_secs_to_epoch_ms(created_at),
                seen,
            },
        }
    }
}

// Non-finite input maps to 0 and out-of-range values saturate.
fn apple_reference_secs_to_epoch_ms(secs: f64) -> i64 {
    let ms = (secs * 1000.0).round() as i64;
    ms.saturating_add(APPLE_REFERENCE_EPOCH_SECS * 1000)
}

/// Validation failures for reminder records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyTitle,
    EmptyKind,
    NegativeTimestamp {
        field: &'static str,
        value: i64,
    },
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "reminder title cannot be empty"),
            Self::EmptyKind => write!(f, "reminder type cannot be empty"),
            Self::NegativeTimestamp { field, value } => {
                write!(f, "{field} must be a non-negative epoch value, got {value}")
            }
        }
    }
}

impl Error for ReminderValidationError {}

impl Reminder {
    /// Creates an unseen reminder with a generated ID and `created_at = now`.
    pub fn new(title: impl Into<String>, scheduled_for_ms: i64, kind: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, scheduled_for_ms, kind, now_epoch_ms())
    }

    /// Creates an unseen reminder with caller-provided identity and creation time.
    ///
    /// Used by import paths and tests where both values already exist.
    pub fn with_id(
        id: ReminderId,
        title: impl Into<String>,
        scheduled_for_ms: i64,
        kind: impl Into<String>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            scheduled_for_ms,
            kind: kind.into(),
            created_at_ms,
            seen: false,
        }
    }

    /// Creation time, Unix epoch milliseconds.
    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn is_seen(&self) -> bool {
        self.seen
    }

    /// Flags the reminder as seen.
    ///
    /// Returns `true` only when the flag actually changed.
    pub fn mark_seen(&mut self) -> bool {
        if self.seen {
            return false;
        }
        self.seen = true;
        true
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }
        if self.kind.trim().is_empty() {
            return Err(ReminderValidationError::EmptyKind);
        }
        if self.scheduled_for_ms < 0 {
            return Err(ReminderValidationError::NegativeTimestamp {
                field: "scheduled_for",
                value: self.scheduled_for_ms,
            });
        }
        if self.created_at_ms < 0 {
            return Err(ReminderValidationError::NegativeTimestamp {
                field: "created_at",
                value: self.created_at_ms,
            });
        }
        Ok(())
    }
}

/// List ordering: unseen before seen, then later appointments first.
pub fn display_order(a: &Reminder, b: &Reminder) -> Ordering {
    a.seen
        .cmp(&b.seen)
        .then_with(|| b.scheduled_for_ms.cmp(&a.scheduled_for_ms))
}

/// Sorts reminders in place by [`display_order`].
///
/// Stable: records equal on both keys keep their prior relative order.
pub fn sort_reminders(reminders: &mut [Reminder]) {
    reminders.sort_by(display_order);
}

/// How long before the appointment the notification should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadTime {
    FiveMinutes,
    #[default]
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    Custom(u32),
}

impl LeadTime {
    /// Picker presets in display order.
    pub const PRESETS: [LeadTime; 5] = [
        LeadTime::FiveMinutes,
        LeadTime::FifteenMinutes,
        LeadTime::ThirtyMinutes,
        LeadTime::OneHour,
        LeadTime::TwoHours,
    ];

    /// Maps a minute count onto a preset when one matches.
    pub fn from_minutes(minutes: u32) -> Self {
        Self::PRESETS
            .into_iter()
            .find(|preset| preset.minutes() == minutes)
            .unwrap_or(LeadTime::Custom(minutes))
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::TwoHours => 120,
            Self::Custom(minutes) => minutes,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.minutes()) * 60)
    }

    /// Short human label, e.g. `15 min` or `2 hours`.
    pub fn label(self) -> String {
        let minutes = self.minutes();
        match minutes {
            60 => "1 hour".to_string(),
            m if m > 60 && m % 60 == 0 => format!("{} hours", m / 60),
            m => format!("{m} min"),
        }
    }
}

impl From<LeadTime> for Duration {
    fn from(value: LeadTime) -> Self {
        value.as_duration()
    }
}

/// Current wall-clock time as Unix epoch milliseconds.
///
/// Clamps to `0` if the system clock reports a pre-epoch time.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
