//! Scheduler that records commands for a host platform to apply.
//!
//! The mobile shell owns the real OS notification center. Core validates
//! each request, then hands the host an ordered list of schedule/cancel
//! commands alongside the operation result.

use super::{
    check_request, NotificationRequest, NotificationScheduler, ScheduleError, SchedulerClock,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Instruction for the host notification center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NotificationCommand {
    Schedule(NotificationRequest),
    Cancel { identifier: String },
}

/// Records accepted commands in call order.
#[derive(Debug, Default)]
pub struct OutboxScheduler {
    clock: SchedulerClock,
    commands: Mutex<Vec<NotificationCommand>>,
}

impl OutboxScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outbox whose notion of "now" is pinned to `now_ms`.
    pub fn at(now_ms: i64) -> Self {
        Self {
            clock: SchedulerClock::Fixed(now_ms),
            commands: Mutex::default(),
        }
    }

    /// Takes every recorded command, leaving the outbox empty.
    pub fn drain(&self) -> Vec<NotificationCommand> {
        self.commands
            .lock()
            .map(|mut commands| std::mem::take(&mut *commands))
            .unwrap_or_default()
    }

    fn push(&self, command: NotificationCommand) -> Result<(), ScheduleError> {
        self.commands
            .lock()
            .map(|mut commands| commands.push(command))
            .map_err(|_| ScheduleError::Rejected("outbox lock poisoned".to_string()))
    }
}

impl NotificationScheduler for OutboxScheduler {
    fn schedule(&self, request: &NotificationRequest) -> Result<(), ScheduleError> {
        check_request(request, self.clock.now_ms())?;
        self.push(NotificationCommand::Schedule(request.clone()))
    }

    fn cancel(&self, identifier: &str) {
        let command = NotificationCommand::Cancel {
            identifier: identifier.to_string(),
        };
        if let Err(err) = self.push(command) {
            warn!(
                "event=notification_cancel module=scheduler status=error error_code=outbox_unavailable error={err}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationCommand, OutboxScheduler};
    use crate::scheduler::{NotificationRequest, NotificationScheduler};

    #[test]
    fn records_commands_in_call_order_and_drains() {
        let outbox = OutboxScheduler::at(0);
        let request = NotificationRequest {
            identifier: "r1".to_string(),
            fire_at_ms: 10,
            title: "t".to_string(),
            body: "b".to_string(),
            payload: None,
        };
        outbox.schedule(&request).unwrap();
        outbox.cancel("r1");

        let commands = outbox.drain();
        assert_eq!(
            commands,
            vec![
                NotificationCommand::Schedule(request),
                NotificationCommand::Cancel {
                    identifier: "r1".to_string()
                },
            ]
        );
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn rejected_request_is_not_recorded() {
        let outbox = OutboxScheduler::at(100);
        let request = NotificationRequest {
            identifier: "r1".to_string(),
            fire_at_ms: 10,
            title: "t".to_string(),
            body: "b".to_string(),
            payload: None,
        };
        assert!(outbox.schedule(&request).is_err());
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn cancel_on_poisoned_outbox_does_not_panic() {
        let outbox = OutboxScheduler::at(0);
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _commands = outbox.commands.lock().unwrap();
            panic!("poison outbox lock");
        }));
        assert!(poisoned.is_err());

        outbox.cancel("r1");
        assert!(outbox.drain().is_empty());
    }
}
