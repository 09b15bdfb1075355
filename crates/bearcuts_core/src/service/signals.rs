//! Delivery signals routed from the notification scheduler into the store.
//!
//! # Responsibility
//! - Translate scheduler callbacks into direct store calls.
//! - Build the detail text shown when a reminder alert is tapped.
//!
//! # Invariants
//! - Signal handling is idempotent; duplicated or late signals are safe.
//! - No debounce or delay is applied here.

use crate::kv::KeyValueStore;
use crate::model::reminder::ReminderId;
use crate::scheduler::{NotificationScheduler, ReminderPayload};
use crate::service::reminder_store::ReminderStore;

/// Callback raised by the platform after an alert is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSignal {
    /// The user opened a delivered reminder alert.
    Tapped(ReminderPayload),
    /// The reminder should be flagged as seen.
    MarkSeen(ReminderId),
}

/// What the presentation layer shows after a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDetails {
    pub reminder_id: ReminderId,
    pub title: String,
    pub message: String,
    pub scheduled_for_ms: i64,
    /// Whether this signal flipped the record to seen.
    pub newly_seen: bool,
}

impl<K: KeyValueStore, S: NotificationScheduler> ReminderStore<K, S> {
    /// Applies a delivery signal.
    ///
    /// A tap also marks the reminder seen. Details are returned even when the
    /// record has been deleted since, because the payload is self-contained.
    pub fn handle_signal(&mut self, signal: NotificationSignal) -> Option<ReminderDetails> {
        match signal {
            NotificationSignal::MarkSeen(id) => {
                self.mark_seen(id);
                None
            }
            NotificationSignal::Tapped(payload) => {
                let newly_seen = self.mark_seen(payload.reminder_id);
                Some(ReminderDetails {
                    reminder_id: payload.reminder_id,
                    title: self.config().alert_title(),
                    message: format!(
                        "You have a {} appointment coming up!",
                        payload.kind
                    ),
                    scheduled_for_ms: payload.scheduled_for_ms,
                    newly_seen,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationSignal;
    use crate::config::StoreConfig;
    use crate::kv::MemoryKeyValueStore;
    use crate::model::reminder::LeadTime;
    use crate::scheduler::{InMemoryScheduler, ReminderPayload};
    use crate::service::reminder_store::ReminderStore;
    use uuid::Uuid;

    #[test]
    fn tap_marks_seen_once_and_returns_details() {
        let kv = MemoryKeyValueStore::new();
        let scheduler = InMemoryScheduler::at(0);
        let mut store = ReminderStore::load(&kv, &scheduler, StoreConfig::default()).unwrap();
        let created = store
            .create(3_600_000, "Hair Styles", LeadTime::FifteenMinutes)
            .unwrap()
            .reminder;

        let payload = ReminderPayload {
            reminder_id: created.id,
            scheduled_for_ms: created.scheduled_for_ms,
            kind: created.kind.clone(),
        };
        let first = store
            .handle_signal(NotificationSignal::Tapped(payload.clone()))
            .expect("tap returns details");
        assert!(first.newly_seen);
        assert_eq!(first.title, "🐻 Bear Cuts Reminder");
        assert!(first.message.contains("Hair Styles"));

        let second = store
            .handle_signal(NotificationSignal::Tapped(payload))
            .expect("tap returns details");
        assert!(!second.newly_seen);
        assert!(store.get(created.id).unwrap().is_seen());
    }

    #[test]
    fn late_signals_for_deleted_reminders_are_harmless() {
        let kv = MemoryKeyValueStore::new();
        let scheduler = InMemoryScheduler::at(0);
        let mut store = ReminderStore::load(&kv, &scheduler, StoreConfig::default()).unwrap();
        let gone = Uuid::new_v4();

        assert!(store
            .handle_signal(NotificationSignal::MarkSeen(gone))
            .is_none());
        let details = store
            .handle_signal(NotificationSignal::Tapped(ReminderPayload {
                reminder_id: gone,
                scheduled_for_ms: 10,
                kind: "Hair Styles".to_string(),
            }))
            .expect("tap returns details");
        assert!(!details.newly_seen);
        assert!(store.is_empty());
    }
}
