//! Option lists for the node's dynamic dropdowns
//!
//! A synchronous-style "list options for field X" capability: each call
//! fetches what it needs from the API and returns display entries.

use maileon_core::{FieldSchema, MaileonClient, MaileonError, Transport};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const EVENT_TYPE_REQUIRED: &str = "Please select an Event Type before mapping fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    ContactFields,
    EventTypes,
    EventFields,
}

impl FromStr for OptionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact-fields" | "contactFields" => Ok(Self::ContactFields),
            "event-types" | "eventTypes" => Ok(Self::EventTypes),
            "event-fields" | "eventFields" => Ok(Self::EventFields),
            other => Err(format!("unknown option list '{other}'")),
        }
    }
}

impl fmt::Display for OptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ContactFields => "contact-fields",
            Self::EventTypes => "event-types",
            Self::EventFields => "event-fields",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionEntry {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Standard fields first, then the account's custom fields
pub fn contact_field_options(custom: &FieldSchema) -> Vec<OptionEntry> {
    let standard = FieldSchema::standard_contact();
    let standard = standard.fields().iter().map(|f| OptionEntry {
        name: format!("{} (standard - {})", f.name, f.field_type),
        value: f.name.clone(),
        description: None,
    });
    let custom = custom.fields().iter().map(|f| OptionEntry {
        name: format!("{} (custom - {})", f.name, f.field_type),
        value: f.name.clone(),
        description: None,
    });
    standard.chain(custom).collect()
}

/// Event attributes; mandatory ones are starred and described as required
pub fn event_field_options(schema: &FieldSchema) -> Vec<OptionEntry> {
    schema
        .fields()
        .iter()
        .map(|f| {
            let marker = if f.mandatory { " *" } else { "" };
            OptionEntry {
                name: format!("{} ({}){marker}", f.name, f.field_type),
                value: f.name.clone(),
                description: f.mandatory.then(|| "Required".to_string()),
            }
        })
        .collect()
}

pub async fn list_options<T: Transport>(
    client: &MaileonClient<T>,
    field: OptionField,
    event_type: Option<&str>,
) -> Result<Vec<OptionEntry>, MaileonError> {
    match field {
        OptionField::ContactFields => Ok(contact_field_options(&client.custom_fields().await?)),
        OptionField::EventTypes => Ok(client
            .transaction_types()
            .await?
            .into_iter()
            .map(|name| OptionEntry {
                value: name.clone(),
                name,
                description: None,
            })
            .collect()),
        OptionField::EventFields => {
            let event_type = event_type
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| MaileonError::config(EVENT_TYPE_REQUIRED))?;
            Ok(event_field_options(&client.transaction_type(event_type).await?))
        }
    }
}
