//! Evaluation of templated parameter values against the current input record
//!
//! A raw value that is exactly one `{{ expression }}` keeps the structured
//! result of the expression. Anything else containing template syntax renders
//! to a string, and plain strings pass through untouched.

use crate::error::MaileonError;
use minijinja::Environment;
use serde_json::{Map, Value};

/// Evaluates a raw parameter value in the context of one input record
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, raw: &str, record: &Value) -> Result<Value, MaileonError>;

    /// Evaluate and flatten the result to a string (`null` becomes empty)
    fn evaluate_string(&self, raw: &str, record: &Value) -> Result<String, MaileonError> {
        Ok(match self.evaluate(raw, record)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Evaluator that never interprets template syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralEvaluator;

impl ExpressionEvaluator for LiteralEvaluator {
    fn evaluate(&self, raw: &str, _record: &Value) -> Result<Value, MaileonError> {
        Ok(Value::String(raw.to_string()))
    }
}

/// minijinja-backed evaluator; the record is exposed as top-level variables and as `json`
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn context(record: &Value) -> minijinja::Value {
        let mut ctx = match record {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        ctx.insert("json".to_string(), record.clone());
        minijinja::Value::from_serialize(&ctx)
    }
}

/// The inner expression when `raw` is a single `{{ ... }}` block and nothing else
fn sole_expression(raw: &str) -> Option<&str> {
    let inner = raw.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim_matches('-').trim())
}

fn has_template_syntax(raw: &str) -> bool {
    raw.contains("{{") || raw.contains("{%")
}

impl ExpressionEvaluator for TemplateEvaluator {
    fn evaluate(&self, raw: &str, record: &Value) -> Result<Value, MaileonError> {
        if !has_template_syntax(raw) {
            return Ok(Value::String(raw.to_string()));
        }

        let ctx = Self::context(record);
        let template_error = |e: minijinja::Error| MaileonError::Template {
            message: format!("{raw}: {e}"),
        };

        if let Some(expr) = sole_expression(raw) {
            let env = Environment::new();
            let result = env
                .compile_expression(expr)
                .and_then(|compiled| compiled.eval(&ctx))
                .map_err(template_error)?;
            if result.is_undefined() || result.is_none() {
                return Ok(Value::Null);
            }
            return serde_json::to_value(&result).map_err(|e| MaileonError::Template {
                message: format!("{raw}: {e}"),
            });
        }

        Environment::new()
            .render_str(raw, &ctx)
            .map(Value::String)
            .map_err(template_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "email": "jane@example.com",
            "first": "Jane",
            "points": 42,
            "tags": ["a", "b"],
            "address": {"city": "Berlin"}
        })
    }

    #[test]
    fn test_plain_strings_pass_through() {
        let eval = TemplateEvaluator::new();
        assert_eq!(
            eval.evaluate("static value", &record()).unwrap(),
            json!("static value")
        );
    }

    #[test]
    fn test_sole_expression_keeps_structure() {
        let eval = TemplateEvaluator::new();
        assert_eq!(eval.evaluate("{{ points }}", &record()).unwrap(), json!(42));
        assert_eq!(eval.evaluate("{{ json.tags }}", &record()).unwrap(), json!(["a", "b"]));
        assert_eq!(
            eval.evaluate(" {{ address.city }} ", &record()).unwrap(),
            json!("Berlin")
        );
    }

    #[test]
    fn test_mixed_template_renders_string() {
        let eval = TemplateEvaluator::new();
        assert_eq!(
            eval.evaluate("Hello {{ first }} ({{ points }})", &record()).unwrap(),
            json!("Hello Jane (42)")
        );
    }

    #[test]
    fn test_missing_variable_is_null() {
        let eval = TemplateEvaluator::new();
        assert_eq!(eval.evaluate("{{ nope }}", &record()).unwrap(), Value::Null);
        assert_eq!(eval.evaluate_string("{{ nope }}", &record()).unwrap(), "");
    }

    #[test]
    fn test_syntax_error_is_template_error() {
        let eval = TemplateEvaluator::new();
        let err = eval.evaluate("{{ points + }}", &record()).unwrap_err();
        assert!(matches!(err, MaileonError::Template { .. }));
    }

    #[test]
    fn test_evaluate_string_flattens_scalars() {
        let eval = TemplateEvaluator::new();
        assert_eq!(eval.evaluate_string("{{ points }}", &record()).unwrap(), "42");
        assert_eq!(
            eval.evaluate_string("{{ email }}", &record()).unwrap(),
            "jane@example.com"
        );
    }

    #[test]
    fn test_literal_evaluator_ignores_syntax() {
        assert_eq!(
            LiteralEvaluator.evaluate("{{ points }}", &record()).unwrap(),
            json!("{{ points }}")
        );
    }
}
