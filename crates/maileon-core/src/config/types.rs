//! Configuration types
//!
//! Every field is optional on disk so that layered files only override what
//! they actually set; accessors supply the defaults.

use crate::client::{DEFAULT_API_BASE, DEFAULT_HEARTBEAT_URL};
use crate::home::config_dir;
use crate::types::WebhookEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_NODE_ID: &str = "maileon-trigger";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `[api]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_url: Option<String>,
    /// Send the per-invocation heartbeat (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<bool>,
}

impl ApiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Heartbeat target, or `None` when disabled
    pub fn heartbeat_url(&self) -> Option<String> {
        if !self.heartbeat.unwrap_or(true) {
            return None;
        }
        Some(
            self.heartbeat_url
                .clone()
                .unwrap_or_else(|| DEFAULT_HEARTBEAT_URL.to_string()),
        )
    }
}

/// `[trigger]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Public URL Maileon should deliver events to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<WebhookEvent>,
    /// Scope of the stored registration (`{node_id}.webhookId`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl TriggerConfig {
    pub fn event(&self) -> WebhookEvent {
        self.event.unwrap_or_default()
    }

    pub fn node_id(&self) -> &str {
        self.node_id.as_deref().unwrap_or(DEFAULT_NODE_ID)
    }

    pub fn state_file(&self, home_dir: &Path) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| config_dir(home_dir).join("state.json"))
    }
}
