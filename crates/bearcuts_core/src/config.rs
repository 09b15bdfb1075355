//! Store configuration and environment lookups.
//!
//! # Responsibility
//! - Hold the per-app constants the reminder store depends on.
//! - Resolve environment overrides shared by the FFI and CLI entry points.

use std::path::PathBuf;

/// Environment variable overriding the on-device database path.
pub const DB_PATH_ENV: &str = "BEARCUTS_DB_PATH";
/// Environment variable enabling file logging for the CLI.
pub const LOG_DIR_ENV: &str = "BEARCUTS_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "bearcuts.sqlite3";

/// Reminder store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key under which the whole reminder collection is persisted.
    pub storage_key: String,
    /// Brand used in reminder titles and alert text.
    pub brand: String,
    /// Category used when a caller does not pick one.
    pub default_kind: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "BearCutsReminders".to_string(),
            brand: "Bear Cuts".to_string(),
            default_kind: "Hair Styles".to_string(),
        }
    }
}

impl StoreConfig {
    /// Title stored on reminders of `kind`, e.g. `Bear Cuts - Hair Styles`.
    pub fn reminder_title(&self, kind: &str) -> String {
        format!("{} - {}", self.brand, kind)
    }

    /// Title shown on delivered reminder alerts.
    pub fn alert_title(&self) -> String {
        format!("🐻 {} Reminder", self.brand)
    }
}

/// Resolves the database path from `BEARCUTS_DB_PATH`, falling back to the
/// platform temp directory.
pub fn resolve_db_path() -> PathBuf {
    env_path(DB_PATH_ENV).unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

/// Reads a non-blank path from environment variable `name`.
pub fn env_path(name: &str) -> Option<PathBuf> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
