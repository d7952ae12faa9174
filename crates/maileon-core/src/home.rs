//! Home directory resolution
//!
//! `MAILEON_HOME` (when set and non-empty) replaces the platform home
//! directory. Integration tests point it at a temp dir so the global config
//! and trigger state never touch the real user profile.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const HOME_ENV: &str = "MAILEON_HOME";

/// Home directory used for `~/.config/maileon`
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().context("Could not determine home directory")
}

/// `{home}/.config/maileon`
pub fn config_dir(home: &std::path::Path) -> PathBuf {
    home.join(".config").join("maileon")
}
