//! Parsing of the XML schema documents served by the Maileon API
//!
//! - `GET /contacts/fields/custom` → `custom_fields/custom_field` (name, type)
//! - `GET /transactions/types` → `transaction_types/transaction_type` (name)
//! - `GET /transactions/types/{name}` → `transaction_type/attributes/attribute`
//!   (name, type, mandatory)
//!
//! Repeated nodes deserialize into `Vec`s, so a document with a single
//! occurrence yields the same list shape as one with many. Empty or absent
//! collections yield an empty list.

use crate::coerce::FieldType;
use crate::error::MaileonError;
use crate::fields::{FieldDescriptor, FieldSchema};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Default, Deserialize)]
struct CustomFieldsDoc {
    #[serde(default, rename = "custom_field")]
    fields: Vec<CustomFieldXml>,
}

#[derive(Debug, Deserialize)]
struct CustomFieldXml {
    name: String,
    #[serde(rename = "type", default)]
    field_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionTypesDoc {
    #[serde(default, rename = "transaction_type")]
    types: Vec<TransactionTypeSummaryXml>,
}

#[derive(Debug, Deserialize)]
struct TransactionTypeSummaryXml {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionTypeDoc {
    #[serde(default)]
    attributes: AttributesXml,
}

#[derive(Debug, Default, Deserialize)]
struct AttributesXml {
    #[serde(default, rename = "attribute")]
    items: Vec<AttributeXml>,
}

#[derive(Debug, Deserialize)]
struct AttributeXml {
    name: String,
    #[serde(rename = "type", default)]
    attr_type: Option<String>,
    #[serde(default)]
    mandatory: Option<String>,
}

fn parse_doc<T: DeserializeOwned + Default>(xml: &str, what: &'static str) -> Result<T, MaileonError> {
    if xml.trim().is_empty() {
        return Ok(T::default());
    }

    quick_xml::de::from_str(xml).map_err(|e| MaileonError::Schema {
        what,
        message: e.to_string(),
        source: Some(Box::new(e)),
    })
}

fn field_type(name: Option<String>) -> FieldType {
    name.map(FieldType::from).unwrap_or(FieldType::String)
}

/// Custom contact fields defined for the account
pub fn parse_custom_fields(xml: &str) -> Result<FieldSchema, MaileonError> {
    let doc: CustomFieldsDoc = parse_doc(xml, "custom fields")?;
    Ok(doc
        .fields
        .into_iter()
        .map(|f| FieldDescriptor::new(f.name, field_type(f.field_type)))
        .collect::<Vec<_>>()
        .into())
}

/// Names of all transaction (event) types
pub fn parse_transaction_types(xml: &str) -> Result<Vec<String>, MaileonError> {
    let doc: TransactionTypesDoc = parse_doc(xml, "transaction types")?;
    Ok(doc.types.into_iter().map(|t| t.name).collect())
}

/// Attributes of a single transaction type, with mandatory flags
pub fn parse_transaction_type(xml: &str) -> Result<FieldSchema, MaileonError> {
    let doc: TransactionTypeDoc = parse_doc(xml, "transaction type")?;
    Ok(doc
        .attributes
        .items
        .into_iter()
        .map(|a| {
            let mandatory = a.mandatory.as_deref().map(str::trim) == Some("true");
            FieldDescriptor::new(a.name, field_type(a.attr_type)).mandatory(mandatory)
        })
        .collect::<Vec<_>>()
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_CUSTOM_FIELD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<custom_fields>
  <custom_field>
    <name>loyalty_points</name>
    <type>integer</type>
  </custom_field>
</custom_fields>"#;

    const TWO_CUSTOM_FIELDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<custom_fields>
  <custom_field><name>loyalty_points</name><type>integer</type></custom_field>
  <custom_field><name>newsletter_topics</name><type>json</type></custom_field>
</custom_fields>"#;

    #[test]
    fn test_single_and_multiple_occurrences_normalize_to_lists() {
        let one = parse_custom_fields(ONE_CUSTOM_FIELD).unwrap();
        let two = parse_custom_fields(TWO_CUSTOM_FIELDS).unwrap();

        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(one.fields()[0], two.fields()[0]);
        assert_eq!(two.type_of("newsletter_topics"), Some(&FieldType::Json));
    }

    #[test]
    fn test_empty_collections_yield_empty_lists() {
        assert!(parse_custom_fields("<custom_fields/>").unwrap().is_empty());
        assert!(parse_custom_fields("<custom_fields></custom_fields>").unwrap().is_empty());
        assert!(parse_custom_fields("").unwrap().is_empty());
        assert!(parse_transaction_types("<transaction_types/>").unwrap().is_empty());
        assert!(
            parse_transaction_type("<transaction_type><name>x</name></transaction_type>")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_transaction_types_list_names_in_order() {
        let xml = r#"<transaction_types>
  <transaction_type><id>1</id><name>order_placed</name></transaction_type>
  <transaction_type><id>2</id><name>cart_abandoned</name></transaction_type>
</transaction_types>"#;
        assert_eq!(
            parse_transaction_types(xml).unwrap(),
            vec!["order_placed".to_string(), "cart_abandoned".to_string()]
        );
    }

    #[test]
    fn test_transaction_type_attributes_with_mandatory_flags() {
        let xml = r#"<transaction_type>
  <id>7</id>
  <name>order_placed</name>
  <attributes>
    <attribute><id>1</id><name>order_id</name><type>string</type><mandatory>true</mandatory></attribute>
    <attribute><id>2</id><name>total</name><type>float</type><mandatory>false</mandatory></attribute>
  </attributes>
</transaction_type>"#;

        let schema = parse_transaction_type(xml).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("order_id").unwrap().mandatory);
        assert!(!schema.get("total").unwrap().mandatory);
        assert_eq!(schema.type_of("total"), Some(&FieldType::Float));
    }

    #[test]
    fn test_single_attribute_normalizes_to_list() {
        let xml = r#"<transaction_type><name>ping</name><attributes>
  <attribute><name>source</name><type>string</type></attribute>
</attributes></transaction_type>"#;
        let schema = parse_transaction_type(xml).unwrap();
        assert_eq!(schema.len(), 1);
        assert!(!schema.fields()[0].mandatory);
    }

    #[test]
    fn test_malformed_xml_is_reported() {
        let err = parse_custom_fields("<custom_fields><custom_field>").unwrap_err();
        assert!(matches!(err, MaileonError::Schema { what: "custom fields", .. }));
    }
}
