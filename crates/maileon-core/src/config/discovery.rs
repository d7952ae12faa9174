//! Configuration discovery and resolution

use super::types::Config;
use crate::home::config_dir;
use crate::types::WebhookEvent;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const REPO_CONFIG_FILE: &str = ".maileon.toml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "No Maileon API key configured (set MAILEON_API_KEY, pass --api-key, or add [credentials] api_key)"
    )]
    MissingApiKey,
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub webhook_url: Option<String>,
    pub event: Option<WebhookEvent>,
    /// Explicit config file, layered above the discovered ones
    pub config_path: Option<PathBuf>,
}

/// Resolve configuration from all sources, reading the process environment
pub fn resolve_config(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
) -> Result<Config, ConfigError> {
    resolve_config_with_env(overrides, current_dir, home_dir, |key| {
        std::env::var(key).ok()
    })
}

/// Resolve configuration with an injectable environment lookup
///
/// Unreadable discovered files are skipped with a warning; an explicit
/// `config_path` must load.
pub fn resolve_config_with_env(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    let global_config_path = config_dir(home_dir).join("config.toml");
    if global_config_path.exists() {
        match load_config_file(&global_config_path) {
            Ok(file_config) => merge_config(&mut config, file_config),
            Err(e) => warn!("Ignoring global config: {e}"),
        }
    }

    if let Some(repo_config) = find_repo_local_config(current_dir) {
        match load_config_file(&repo_config) {
            Ok(file_config) => merge_config(&mut config, file_config),
            Err(e) => warn!("Ignoring repo config: {e}"),
        }
    }

    if let Some(path) = &overrides.config_path {
        merge_config(&mut config, load_config_file(path)?);
    }

    apply_env_overrides(&mut config, env);
    apply_cli_overrides(&mut config, overrides);

    Ok(config)
}

/// Searches the current directory and its parents, stopping at the git root
fn find_repo_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(REPO_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_option<T>(base: &mut Option<T>, layer: Option<T>) {
    if layer.is_some() {
        *base = layer;
    }
}

/// Later layers override only the fields they set
fn merge_config(base: &mut Config, file: Config) {
    merge_option(&mut base.credentials.api_key, file.credentials.api_key);

    merge_option(&mut base.api.base_url, file.api.base_url);
    merge_option(&mut base.api.heartbeat_url, file.api.heartbeat_url);
    merge_option(&mut base.api.heartbeat, file.api.heartbeat);

    merge_option(&mut base.trigger.webhook_url, file.trigger.webhook_url);
    merge_option(&mut base.trigger.event, file.trigger.event);
    merge_option(&mut base.trigger.node_id, file.trigger.node_id);
    merge_option(&mut base.trigger.state_file, file.trigger.state_file);
}

/// Apply environment variable overrides; empty values are ignored
pub fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(api_key) = non_empty("MAILEON_API_KEY") {
        config.credentials.api_key = Some(api_key);
    }
    if let Some(base_url) = non_empty("MAILEON_API_BASE") {
        config.api.base_url = Some(base_url);
    }
    if let Some(webhook_url) = non_empty("MAILEON_WEBHOOK_URL") {
        config.trigger.webhook_url = Some(webhook_url);
    }
}

fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    merge_option(&mut config.credentials.api_key, overrides.api_key.clone());
    merge_option(&mut config.api.base_url, overrides.base_url.clone());
    merge_option(&mut config.trigger.webhook_url, overrides.webhook_url.clone());
    merge_option(&mut config.trigger.event, overrides.event);
}

impl Config {
    /// The API key, required by every command that talks to Maileon
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.credentials
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
