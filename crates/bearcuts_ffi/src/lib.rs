//! Flutter-facing bridge for Bear Cuts core.

pub mod api;
