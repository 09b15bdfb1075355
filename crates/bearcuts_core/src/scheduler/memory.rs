//! In-process scheduler that holds pending alerts until they are due.

use super::{
    check_request, NotificationRequest, NotificationScheduler, ScheduleError, SchedulerClock,
};
use log::warn;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Pending-alert queue keyed by request identifier.
///
/// Stands in for the OS facility in the CLI and in tests.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    clock: SchedulerClock,
    pending: Mutex<BTreeMap<String, NotificationRequest>>,
}

impl InMemoryScheduler {
    /// Creates a scheduler that checks fire times against the wall clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler whose notion of "now" is pinned to `now_ms`.
    pub fn at(now_ms: i64) -> Self {
        Self {
            clock: SchedulerClock::Fixed(now_ms),
            pending: Mutex::default(),
        }
    }

    /// Snapshot of pending requests ordered by fire time, then identifier.
    pub fn pending(&self) -> Vec<NotificationRequest> {
        let mut requests: Vec<_> = match self.pending.lock() {
            Ok(pending) => pending.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        requests.sort_by(|a, b| {
            a.fire_at_ms
                .cmp(&b.fire_at_ms)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        requests
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.contains_key(identifier))
            .unwrap_or(false)
    }

    /// Removes and returns every request due at or before `now_ms`, in fire order.
    pub fn take_due(&self, now_ms: i64) -> Vec<NotificationRequest> {
        let Ok(mut pending) = self.pending.lock() else {
            return Vec::new();
        };
        let due_ids: Vec<String> = pending
            .iter()
            .filter(|(_, request)| request.fire_at_ms <= now_ms)
            .map(|(identifier, _)| identifier.clone())
            .collect();
        let mut due: Vec<_> = due_ids
            .iter()
            .filter_map(|identifier| pending.remove(identifier))
            .collect();
        due.sort_by(|a, b| {
            a.fire_at_ms
                .cmp(&b.fire_at_ms)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        due
    }
}

impl NotificationScheduler for InMemoryScheduler {
    fn schedule(&self, request: &NotificationRequest) -> Result<(), ScheduleError> {
        check_request(request, self.clock.now_ms())?;
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ScheduleError::Rejected("scheduler lock poisoned".to_string()))?;
        pending.insert(request.identifier.clone(), request.clone());
        Ok(())
    }

    fn cancel(&self, identifier: &str) {
        match self.pending.lock() {
            Ok(mut pending) => {
                pending.remove(identifier);
            }
            Err(_) => warn!(
                "event=notification_cancel module=scheduler status=error error_code=lock_poisoned"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryScheduler;
    use crate::scheduler::{NotificationRequest, NotificationScheduler, ScheduleError};

    fn request(identifier: &str, fire_at_ms: i64) -> NotificationRequest {
        NotificationRequest {
            identifier: identifier.to_string(),
            fire_at_ms,
            title: "title".to_string(),
            body: "body".to_string(),
            payload: None,
        }
    }

    #[test]
    fn same_identifier_replaces_pending_request() {
        let scheduler = InMemoryScheduler::at(0);
        scheduler.schedule(&request("a", 100)).unwrap();
        scheduler.schedule(&request("a", 200)).unwrap();

        let pending = scheduler.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at_ms, 200);
    }

    #[test]
    fn past_fire_time_is_rejected_and_not_queued() {
        let scheduler = InMemoryScheduler::at(1_000);
        let err = scheduler.schedule(&request("late", 999)).unwrap_err();
        assert!(matches!(err, ScheduleError::FireTimeInPast { .. }));
        assert!(!scheduler.is_pending("late"));
    }

    #[test]
    fn take_due_drains_in_fire_order_and_keeps_future_requests() {
        let scheduler = InMemoryScheduler::at(0);
        scheduler.schedule(&request("b", 300)).unwrap();
        scheduler.schedule(&request("a", 100)).unwrap();
        scheduler.schedule(&request("c", 900)).unwrap();

        let due = scheduler.take_due(300);
        let ids: Vec<_> = due.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(scheduler.is_pending("c"));
        assert!(scheduler.take_due(300).is_empty());
    }

    #[test]
    fn cancel_unknown_identifier_is_noop() {
        let scheduler = InMemoryScheduler::at(0);
        scheduler.schedule(&request("a", 100)).unwrap();
        scheduler.cancel("missing");
        scheduler.cancel("a");
        assert!(scheduler.pending().is_empty());
    }
}
