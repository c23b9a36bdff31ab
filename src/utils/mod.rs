// Utility functions

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use regex::Regex;
use std::sync::{Mutex, MutexGuard, OnceLock};

// =============================================================================
// Paths
// =============================================================================

/// Name of the per-user settings directory under the home directory
pub const APP_DIR_NAME: &str = ".consult-desk";

/// Get the ~/.consult-desk directory path, if a home directory exists.
#[inline]
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR_NAME))
}

// =============================================================================
// Errors and Locks
// =============================================================================

/// Extension trait for Result that provides convenient error context methods.
/// Converts any error to a String with a descriptive message prefix.
///
/// # Example
/// ```ignore
/// use crate::utils::ResultExt;
///
/// let file = std::fs::read_to_string("config.toml")
///     .with_context("Failed to read config file")?;
/// ```
pub trait ResultExt<T> {
    /// Converts the error to a String with context message.
    fn with_context(self, msg: &str) -> Result<T, String>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn with_context(self, msg: &str) -> Result<T, String> {
        self.map_err(|e| format!("{}: {}", msg, e))
    }
}

/// Safely acquire a mutex lock, recovering from poisoning by returning the guard.
/// The consultation map stays usable even if a handler panicked mid-update.
pub fn lock_mutex_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Mutex was poisoned, recovering: {}", poisoned);
            poisoned.into_inner()
        }
    }
}

// =============================================================================
// File Names
// =============================================================================

/// Replace each whitespace run with a single '-' (e.g. "Sam  Lee" -> "Sam-Lee")
pub fn hyphenate(value: &str) -> String {
    static WHITESPACE: OnceLock<Option<Regex>> = OnceLock::new();
    match WHITESPACE.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(re) => re.replace_all(value, "-").into_owned(),
        None => value.to_string(),
    }
}

/// Calendar date (YYYY-MM-DD) used in export file names
pub fn date_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
