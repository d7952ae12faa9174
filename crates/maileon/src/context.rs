//! Shared command plumbing: configuration, client construction, JSON I/O

use anyhow::{Context as _, Result};
use maileon_core::config::{Config, ConfigOverrides, resolve_config};
use maileon_core::home::get_home_dir;
use maileon_core::{HttpTransport, MaileonClient};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolved configuration plus the home directory it was resolved against
pub struct Context {
    pub config: Config,
    pub home_dir: PathBuf,
}

impl Context {
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let home_dir = get_home_dir()?;
        let current_dir = std::env::current_dir()?;
        let config = resolve_config(&overrides, &current_dir, &home_dir)?;
        Ok(Self { config, home_dir })
    }

    /// Authenticated client; fails when no API key is configured
    pub fn client(&self) -> Result<MaileonClient<HttpTransport>> {
        let api_key = self.config.api_key()?;
        let transport = HttpTransport::new(api_key, self.config.api.base_url())?;
        Ok(MaileonClient::new(transport).with_heartbeat_url(self.config.api.heartbeat_url()))
    }
}

/// Read a file, or stdin when `path` is `None` or `-`
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path.filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Parse JSON input; blank input is `null`
pub fn parse_json_input(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).context("input is not valid JSON")
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
