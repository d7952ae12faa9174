//! Node parameters and their validation into a per-operation configuration
//!
//! Parameters arrive as one flat document (TOML or JSON). [`NodeParameters::validate`]
//! checks them once, before any record is processed, and yields an
//! [`OperationConfig`] holding only what the selected operation uses. String
//! parameters may still contain templates; those are evaluated per record by
//! the `resolve` methods.

use maileon_core::template::ExpressionEvaluator;
use maileon_core::{ContactIdentity, FieldMapping, MaileonError, Permission, SyncMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    #[default]
    SendContact,
    SendContactEvent,
    UnsubscribeContact,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SendContact => "sendContact",
            Self::SendContactEvent => "sendContactEvent",
            Self::UnsubscribeContact => "unsubscribeContact",
        })
    }
}

/// Raw node parameters as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParameters {
    pub operation: Operation,
    pub email: String,
    #[serde(alias = "externalId")]
    pub external_id: String,
    #[serde(alias = "mailingId")]
    pub mailing_id: String,
    pub src: String,
    pub permission: Permission,
    #[serde(alias = "syncMode")]
    pub sync_mode: SyncMode,
    pub doi: bool,
    #[serde(alias = "doiKey")]
    pub doi_key: String,
    #[serde(alias = "eventType")]
    pub event_type: String,
    #[serde(alias = "contactFields")]
    pub contact_fields: Vec<FieldMapping>,
    #[serde(alias = "eventFields")]
    pub event_fields: Vec<FieldMapping>,
}

/// Validated configuration for the selected operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationConfig {
    SendContact(ContactConfig),
    SendContactEvent(ContactConfig, EventConfig),
    UnsubscribeContact(UnsubscribeConfig),
}

impl OperationConfig {
    pub fn operation(&self) -> Operation {
        match self {
            Self::SendContact(_) => Operation::SendContact,
            Self::SendContactEvent(..) => Operation::SendContactEvent,
            Self::UnsubscribeContact(_) => Operation::UnsubscribeContact,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactConfig {
    pub email: String,
    pub external_id: String,
    pub src: String,
    pub permission: Permission,
    pub sync_mode: SyncMode,
    pub doi: bool,
    pub doi_key: String,
    pub fields: Vec<FieldMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventConfig {
    pub event_type: String,
    pub fields: Vec<FieldMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribeConfig {
    pub email: String,
    pub external_id: String,
    pub mailing_id: String,
}

/// A contact upsert with every template evaluated for one record
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUpsert {
    pub identity: ContactIdentity,
    pub src: Option<String>,
    pub permission: Permission,
    pub sync_mode: SyncMode,
    pub doi: bool,
    pub doi_key: Option<String>,
    pub fields: Vec<FieldMapping>,
}

fn require(value: &str, what: &str, operation: Operation) -> Result<(), MaileonError> {
    if value.trim().is_empty() {
        return Err(MaileonError::config(format!(
            "{what} is required for {operation}"
        )));
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl NodeParameters {
    /// Double opt-in settings that behave differently above permission 1
    pub fn permission_warnings(&self) -> Vec<String> {
        if self.permission == Permission::None {
            return Vec::new();
        }
        let level = u8::from(self.permission);
        let mut warnings = Vec::new();
        if self.doi {
            warnings.push(format!(
                "Double opt-in only applies at permission 1 (none); ignoring doi for permission {level}"
            ));
        }
        if !self.doi_key.trim().is_empty() {
            warnings.push(format!(
                "DOI mailing key is sent as doimailing at permission {level} as well, not only at permission 1"
            ));
        }
        warnings
    }

    pub fn validate(&self) -> Result<OperationConfig, MaileonError> {
        let operation = self.operation;
        require(&self.email, "Email", operation)?;

        let contact = || {
            for warning in self.permission_warnings() {
                warn!("{warning}");
            }
            ContactConfig {
                email: self.email.clone(),
                external_id: self.external_id.clone(),
                src: self.src.clone(),
                permission: self.permission,
                sync_mode: self.sync_mode,
                doi: self.doi,
                doi_key: self.doi_key.clone(),
                fields: self.contact_fields.clone(),
            }
        };

        Ok(match operation {
            Operation::SendContact => OperationConfig::SendContact(contact()),
            Operation::SendContactEvent => {
                require(&self.event_type, "Event type", operation)?;
                OperationConfig::SendContactEvent(
                    contact(),
                    EventConfig {
                        event_type: self.event_type.clone(),
                        fields: self.event_fields.clone(),
                    },
                )
            }
            Operation::UnsubscribeContact => OperationConfig::UnsubscribeContact(UnsubscribeConfig {
                email: self.email.clone(),
                external_id: self.external_id.clone(),
                mailing_id: self.mailing_id.clone(),
            }),
        })
    }
}

fn resolve_identity(
    email: &str,
    external_id: &str,
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<ContactIdentity, MaileonError> {
    let email = evaluator.evaluate_string(email, record)?;
    if email.trim().is_empty() {
        return Err(MaileonError::config("Email resolved to an empty value"));
    }
    let external_id = evaluator.evaluate_string(external_id, record)?;
    Ok(ContactIdentity::email(email).with_external_id(external_id))
}

impl ContactConfig {
    pub fn resolve(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        record: &Value,
    ) -> Result<ContactUpsert, MaileonError> {
        Ok(ContactUpsert {
            identity: resolve_identity(&self.email, &self.external_id, evaluator, record)?,
            src: non_empty(evaluator.evaluate_string(&self.src, record)?),
            permission: self.permission,
            sync_mode: self.sync_mode,
            doi: self.doi,
            doi_key: non_empty(evaluator.evaluate_string(&self.doi_key, record)?),
            fields: self.fields.clone(),
        })
    }
}

impl EventConfig {
    /// Event type name for one record
    pub fn resolve_type(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        record: &Value,
    ) -> Result<String, MaileonError> {
        let event_type = evaluator.evaluate_string(&self.event_type, record)?;
        if event_type.trim().is_empty() {
            return Err(MaileonError::config("Event type resolved to an empty value"));
        }
        Ok(event_type)
    }
}

impl UnsubscribeConfig {
    /// Identity and optional mailing scope for one record
    pub fn resolve(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        record: &Value,
    ) -> Result<(ContactIdentity, Option<String>), MaileonError> {
        let identity = resolve_identity(&self.email, &self.external_id, evaluator, record)?;
        let mailing_id = non_empty(evaluator.evaluate_string(&self.mailing_id, record)?);
        Ok((identity, mailing_id))
    }
}
