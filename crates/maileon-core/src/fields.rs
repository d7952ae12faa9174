//! Field descriptors, schemas and the built-in standard contact fields

use crate::coerce::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vendor-defined contact attributes and their built-in types
pub const STANDARD_CONTACT_FIELDS: &[(&str, FieldType)] = &[
    ("ADDRESS", FieldType::String),
    ("BIRTHDAY", FieldType::Date),
    ("CITY", FieldType::String),
    ("COUNTRY", FieldType::String),
    ("FIRSTNAME", FieldType::String),
    ("GENDER", FieldType::String),
    ("HNR", FieldType::String),
    ("LASTNAME", FieldType::String),
    ("FULLNAME", FieldType::String),
    ("LOCALE", FieldType::String),
    ("NAMEDAY", FieldType::Date),
    ("ORGANIZATION", FieldType::String),
    ("REGION", FieldType::String),
    ("STATE", FieldType::String),
    ("SALUTATION", FieldType::String),
    ("TITLE", FieldType::String),
    ("ZIP", FieldType::String),
];

/// A named field with its declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Only event attributes carry this; advisory, enforced server-side
    #[serde(default)]
    pub mandatory: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mandatory: false,
        }
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }
}

/// Ordered collection of field descriptors with lookup by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// The fixed standard contact field table
    pub fn standard_contact() -> Self {
        Self::new(
            STANDARD_CONTACT_FIELDS
                .iter()
                .map(|(name, field_type)| FieldDescriptor::new(*name, field_type.clone()))
                .collect(),
        )
    }

    /// Declared type of `name`, if the schema knows the field
    pub fn type_of(&self, name: &str) -> Option<&FieldType> {
        self.get(name).map(|f| &f.field_type)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn mandatory(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.mandatory)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Vec<FieldDescriptor>> for FieldSchema {
    fn from(fields: Vec<FieldDescriptor>) -> Self {
        Self::new(fields)
    }
}

/// One `(field, value)` pair supplied for an input record.
///
/// `value` is usually a string that may contain a template; structured JSON
/// values are accepted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

impl FieldMapping {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_contact_schema() {
        let schema = FieldSchema::standard_contact();
        assert_eq!(schema.len(), STANDARD_CONTACT_FIELDS.len());
        assert_eq!(schema.type_of("BIRTHDAY"), Some(&FieldType::Date));
        assert_eq!(schema.type_of("NAMEDAY"), Some(&FieldType::Date));
        assert_eq!(schema.type_of("ZIP"), Some(&FieldType::String));
        assert!(!schema.contains("birthday"));
        assert!(!schema.contains("EMAIL"));
    }

    #[test]
    fn test_mandatory_filter() {
        let schema = FieldSchema::new(vec![
            FieldDescriptor::new("order_id", FieldType::String).mandatory(true),
            FieldDescriptor::new("note", FieldType::String),
        ]);
        let names: Vec<_> = schema.mandatory().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["order_id"]);
    }

    #[test]
    fn test_field_mapping_deserializes_without_value() {
        let mapping: FieldMapping = serde_json::from_str(r#"{"field": "CITY"}"#).unwrap();
        assert_eq!(mapping.field, "CITY");
        assert!(mapping.value.is_null());
    }
}
