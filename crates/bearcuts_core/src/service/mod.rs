//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate key-value persistence and notification scheduling into
//!   reminder use-cases.
//! - Keep UI/FFI layers decoupled from storage and platform details.

pub mod appointment_alerts;
pub mod reminder_store;
pub mod signals;
