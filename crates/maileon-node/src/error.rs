//! Host-level error for one node invocation

use maileon_core::MaileonError;
use thiserror::Error;

/// Failure of a node invocation.
///
/// `message` is the display text of the underlying error, unchanged, so the
/// caller sees exactly what Maileon or the coercion layer reported.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NodeError {
    pub message: String,
    /// Index of the input record that failed, when the failure is per-record
    pub item_index: Option<usize>,
    #[source]
    pub source: Option<MaileonError>,
}

impl NodeError {
    pub fn at(item_index: usize, source: MaileonError) -> Self {
        Self {
            message: source.to_string(),
            item_index: Some(item_index),
            source: Some(source),
        }
    }

    /// HTTP status of the underlying API error, if any
    pub fn status(&self) -> Option<u16> {
        self.source.as_ref().and_then(MaileonError::status)
    }
}

impl From<MaileonError> for NodeError {
    fn from(source: MaileonError) -> Self {
        Self {
            message: source.to_string(),
            item_index: None,
            source: Some(source),
        }
    }
}
