//! Error taxonomy shared by every Maileon operation

use crate::coerce::CoercionError;
use thiserror::Error;

/// Errors raised while talking to the Maileon API or preparing a request for it
#[derive(Debug, Error)]
pub enum MaileonError {
    /// A mapped value could not be converted to its declared field type
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Network or transport failure before a response was received
    #[error("request failed: {message}")]
    Http {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The API answered with a non-success status; body is kept verbatim
    #[error("Maileon API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A transaction was accepted over HTTP but not reported as queued
    #[error("{message}")]
    NotQueued {
        message: String,
        report: serde_json::Value,
    },

    /// A response body (XML or JSON) could not be parsed
    #[error("failed to parse {what}: {message}")]
    Schema {
        what: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A templated parameter could not be evaluated
    #[error("template error: {message}")]
    Template { message: String },

    /// A successful response was missing something the caller needs
    #[error("unexpected response: {message}")]
    Response { message: String },

    /// The key-value store backing trigger state failed
    #[error("state store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parameters or configuration were rejected before any request was built
    #[error("{message}")]
    Config { message: String },
}

impl MaileonError {
    /// Shorthand for a configuration/validation failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status code when the error came from a non-success API response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_message_is_preserved() {
        let err: MaileonError = CoercionError::InvalidInteger("abc".to_string()).into();
        assert_eq!(err.to_string(), "Invalid integer: abc");
    }

    #[test]
    fn test_api_error_keeps_body_verbatim() {
        let err = MaileonError::Api {
            status: 409,
            body: "<error>contact exists</error>".to_string(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.to_string(),
            "Maileon API returned 409: <error>contact exists</error>"
        );
    }

    #[test]
    fn test_not_queued_displays_vendor_message() {
        let err = MaileonError::NotQueued {
            message: "unknown transaction type".to_string(),
            report: serde_json::json!({"queued": false}),
        };
        assert_eq!(err.to_string(), "unknown transaction type");
        assert_eq!(err.status(), None);
    }
}
