//! Maileon connector node
//!
//! Runs a validated node configuration over a batch of JSON records
//! (send contact, send contact event, unsubscribe), lists dynamic options,
//! and manages the webhook trigger's registration with Maileon.

pub mod error;
pub mod node;
pub mod operations;
pub mod options;
pub mod params;
pub mod trigger;

pub use error::NodeError;
pub use node::MaileonNode;
pub use operations::EnsuredContact;
pub use options::{OptionEntry, OptionField, list_options};
pub use params::{NodeParameters, Operation, OperationConfig};
pub use trigger::{
    RegistrationState, WebhookRegistrar, registration_state, webhook_record, webhook_store_key,
};
