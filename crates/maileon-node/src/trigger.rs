//! Webhook trigger: registration lifecycle and inbound delivery handling
//!
//! A registrar tracks at most one webhook per node. The remote id lives in an
//! injected [`KeyValueStore`] under `{node_id}.webhookId`; its presence is the
//! `Registered` state.

use chrono::{DateTime, Utc};
use maileon_core::coerce::iso_timestamp;
use maileon_core::{KeyValueStore, MaileonClient, MaileonError, Transport, WebhookEvent};
use serde_json::{Map, Value};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Absent,
    Registered { id: String },
}

/// Store key holding the webhook id registered for a node
pub fn webhook_store_key(node_id: &str) -> String {
    format!("{node_id}.webhookId")
}

/// Registration recorded for `node_id`, read from the store alone
pub fn registration_state<S: KeyValueStore>(
    store: &S,
    node_id: &str,
) -> Result<RegistrationState, MaileonError> {
    Ok(match store.get(&webhook_store_key(node_id))? {
        Some(id) if !id.is_empty() => RegistrationState::Registered { id },
        _ => RegistrationState::Absent,
    })
}

pub struct WebhookRegistrar<T, S> {
    client: MaileonClient<T>,
    store: S,
    node_id: String,
    event: WebhookEvent,
    url: String,
}

impl<T: Transport, S: KeyValueStore> WebhookRegistrar<T, S> {
    pub fn new(
        client: MaileonClient<T>,
        store: S,
        node_id: impl Into<String>,
        event: WebhookEvent,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            node_id: node_id.into(),
            event,
            url: url.into(),
        }
    }

    pub fn store_key(&self) -> String {
        webhook_store_key(&self.node_id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> Result<RegistrationState, MaileonError> {
        registration_state(&self.store, &self.node_id)
    }

    /// Look for a remote webhook with exactly this URL and event.
    ///
    /// On a match the id is recorded; otherwise nothing changes.
    pub async fn check_exists(&self) -> Result<bool, MaileonError> {
        let webhooks = self.client.list_webhooks().await?;
        let found = webhooks
            .into_iter()
            .find(|w| w.url == self.url && w.event == self.event.as_str());

        match found {
            Some(webhook) => {
                debug!("Found existing {} webhook {}", self.event, webhook.id);
                self.store.set(&self.store_key(), &webhook.id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Register a new webhook and record its id
    pub async fn create(&self) -> Result<String, MaileonError> {
        let id = self.client.create_webhook(self.event, &self.url).await?;
        self.store.set(&self.store_key(), &id)?;
        info!("Registered {} webhook {id} -> {}", self.event, self.url);
        Ok(id)
    }

    /// Remove the recorded webhook. With nothing recorded this succeeds without a request.
    pub async fn delete(&self) -> Result<bool, MaileonError> {
        let RegistrationState::Registered { id } = self.state()? else {
            debug!("No webhook recorded for {}; nothing to delete", self.node_id);
            return Ok(true);
        };

        self.client.delete_webhook(&id).await?;
        self.store.delete(&self.store_key())?;
        info!("Deleted webhook {id}");
        Ok(true)
    }
}

/// Output record for one inbound delivery.
///
/// `eventType` and `receivedAt` come first; keys of an object body are
/// merged after them and win on collision. A non-object body is kept under `body`.
pub fn webhook_record(event: WebhookEvent, body: Value, received_at: DateTime<Utc>) -> Value {
    let mut record = Map::new();
    record.insert("eventType".to_string(), Value::String(event.as_str().to_string()));
    record.insert(
        "receivedAt".to_string(),
        Value::String(iso_timestamp(received_at)),
    );

    match body {
        Value::Object(fields) => record.extend(fields),
        Value::Null => {}
        other => {
            record.insert("body".to_string(), other);
        }
    }
    Value::Object(record)
}
