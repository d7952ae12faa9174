//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Command-line flags (passed as parameters)
//! 2. Environment variables (`MAILEON_API_KEY`, `MAILEON_API_BASE`, `MAILEON_WEBHOOK_URL`)
//! 3. Repo-local config (`.maileon.toml`, searched upward to the git root)
//! 4. Global config (`~/.config/maileon/config.toml`)
//! 5. Defaults

mod discovery;
mod types;

pub use discovery::{
    ConfigError, ConfigOverrides, apply_env_overrides, load_config_file, resolve_config,
    resolve_config_with_env,
};
pub use types::{ApiConfig, Config, CredentialsConfig, TriggerConfig};
