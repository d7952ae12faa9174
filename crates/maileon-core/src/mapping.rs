//! Field mapping resolution
//!
//! Contact mappings are partitioned into standard and custom fields and
//! coerced to their declared types; names found in neither schema are dropped
//! so partially matching batches still submit. Event mappings go into one flat
//! attribute map without type enforcement.

use crate::coerce::coerce;
use crate::error::MaileonError;
use crate::fields::{FieldMapping, FieldSchema};
use crate::template::ExpressionEvaluator;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Contact attributes ready for the upsert body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactFields {
    pub standard_fields: Map<String, Value>,
    pub custom_fields: Map<String, Value>,
}

/// Evaluate a mapping value once against the record; non-strings pass through
fn evaluate(
    mapping: &FieldMapping,
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<Value, MaileonError> {
    match &mapping.value {
        Value::String(raw) => evaluator.evaluate(raw, record),
        other => Ok(other.clone()),
    }
}

/// Resolve contact mappings against the standard table and the account's custom fields.
///
/// The standard schema takes priority over the custom one for a given name.
pub fn resolve_contact_fields(
    mappings: &[FieldMapping],
    standard: &FieldSchema,
    custom: &FieldSchema,
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<ContactFields, MaileonError> {
    let mut resolved = ContactFields::default();

    for mapping in mappings {
        let name = mapping.field.as_str();
        let (target, field_type) = if let Some(t) = standard.type_of(name) {
            (&mut resolved.standard_fields, t)
        } else if let Some(t) = custom.type_of(name) {
            (&mut resolved.custom_fields, t)
        } else {
            debug!("Dropping unmapped contact field '{name}'");
            continue;
        };

        let input = evaluate(mapping, evaluator, record)?;
        target.insert(name.to_string(), coerce(field_type, &input)?);
    }

    Ok(resolved)
}

/// JavaScript-style falsiness of a raw mapping value
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Resolve event mappings into a flat attribute map.
///
/// Empty raw values are skipped before evaluation. Values are not checked
/// against the event type's attribute schema; the API validates them.
pub fn resolve_event_attributes(
    mappings: &[FieldMapping],
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<Map<String, Value>, MaileonError> {
    let mut attributes = Map::new();

    for mapping in mappings {
        if is_falsy(&mapping.value) {
            continue;
        }
        let value = evaluate(mapping, evaluator, record)?;
        attributes.insert(mapping.field.clone(), value);
    }

    Ok(attributes)
}
