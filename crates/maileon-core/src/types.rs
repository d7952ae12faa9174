//! Shared domain types for contacts and webhooks

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Permission level granted to a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Permission {
    #[default]
    None = 1,
    SingleOptIn = 2,
    ConfirmedOptIn = 3,
    DoubleOptIn = 4,
    DoubleOptInPlus = 5,
}

impl TryFrom<u8> for Permission {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Self::None),
            2 => Ok(Self::SingleOptIn),
            3 => Ok(Self::ConfirmedOptIn),
            4 => Ok(Self::DoubleOptIn),
            5 => Ok(Self::DoubleOptInPlus),
            other => Err(format!("invalid permission level {other} (expected 1-5)")),
        }
    }
}

impl From<Permission> for u8 {
    fn from(permission: Permission) -> Self {
        permission as u8
    }
}

/// What to do when a contact with the same identity already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SyncMode {
    #[default]
    Update = 1,
    Ignore = 2,
}

impl TryFrom<u8> for SyncMode {
    type Error = String;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            1 => Ok(Self::Update),
            2 => Ok(Self::Ignore),
            other => Err(format!("invalid sync mode {other} (expected 1 or 2)")),
        }
    }
}

impl From<SyncMode> for u8 {
    fn from(mode: SyncMode) -> Self {
        mode as u8
    }
}

/// How a contact is addressed: by external id when present, otherwise by email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactIdentity {
    pub email: String,
    pub external_id: Option<String>,
}

impl ContactIdentity {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            external_id: None,
        }
    }

    /// Empty external ids are treated as absent
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        let external_id = external_id.into();
        self.external_id = (!external_id.is_empty()).then_some(external_id);
        self
    }

    /// API path of the contact resource, without any trailing action
    pub fn path(&self) -> String {
        match &self.external_id {
            Some(id) => format!("/contacts/externalid/{}", urlencoding::encode(id)),
            None => format!("/contacts/email/{}", urlencoding::encode(&self.email)),
        }
    }
}

/// Inbound event types a webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEvent {
    /// Double opt-in confirmation
    #[default]
    Doi,
    Unsubscription,
    Bounce,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::Unsubscription => "unsubscription",
            Self::Bounce => "bounce",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doi" => Ok(Self::Doi),
            "unsubscription" => Ok(Self::Unsubscription),
            "bounce" => Ok(Self::Bounce),
            other => Err(format!(
                "unknown webhook event '{other}' (expected doi, unsubscription or bounce)"
            )),
        }
    }
}

/// A webhook registration as listed by `GET /webhooks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub event: String,
}

impl Webhook {
    /// Build from a JSON entry; ids may be numbers or strings
    pub fn from_json(entry: &Value) -> Option<Self> {
        let id = match entry.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self {
            id,
            url: entry.get("url")?.as_str()?.to_string(),
            event: entry.get("event")?.as_str()?.to_string(),
        })
    }
}
