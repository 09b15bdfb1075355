//! Domain model for appointment reminders.
//!
//! # Responsibility
//! - Define the canonical reminder record persisted by core.
//! - Keep ordering and seen-state rules next to the data they govern.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId`.
//! - Deletion is a hard remove; there are no tombstones.

pub mod reminder;
