//! Core types and plumbing for the Maileon connector
//!
//! This crate holds everything the connector needs that is independent of a
//! particular workflow host:
//! - Field type coercion and the standard contact field table
//! - Schema discovery from the XML documents served by the Maileon API
//! - Field mapping resolution into standard/custom contact fields and event attributes
//! - The request model and the [`client::Transport`] seam (reqwest-backed in production)
//! - Key-value stores for trigger registration state
//! - Configuration discovery and logging initialization

pub mod client;
pub mod coerce;
pub mod config;
pub mod error;
pub mod fields;
pub mod home;
pub mod logging;
pub mod mapping;
pub mod schema;
pub mod store;
pub mod template;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use client::{ApiRequest, ApiResponse, HttpTransport, MaileonClient, Method, Transport};
pub use coerce::{CoercionError, FieldType, coerce};
pub use error::MaileonError;
pub use fields::{FieldDescriptor, FieldMapping, FieldSchema};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{ContactIdentity, Permission, SyncMode, Webhook, WebhookEvent};
