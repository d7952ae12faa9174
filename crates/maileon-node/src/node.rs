//! Per-invocation executor
//!
//! One invocation sends the heartbeat, then processes every input record in
//! order. The first failing record aborts the remaining ones; there is no
//! continue-on-error mode.

use crate::error::NodeError;
use crate::operations::{dispatch_event, unsubscribe, upsert_contact};
use crate::params::{NodeParameters, OperationConfig};
use maileon_core::template::{ExpressionEvaluator, TemplateEvaluator};
use maileon_core::{MaileonClient, MaileonError, Transport};
use serde_json::Value;
use tracing::debug;

pub struct MaileonNode<T> {
    client: MaileonClient<T>,
    config: OperationConfig,
    evaluator: Box<dyn ExpressionEvaluator>,
}

impl<T: Transport> MaileonNode<T> {
    /// Validate parameters up front; nothing is sent if they are rejected
    pub fn new(client: MaileonClient<T>, params: &NodeParameters) -> Result<Self, NodeError> {
        Ok(Self {
            client,
            config: params.validate()?,
            evaluator: Box::new(TemplateEvaluator::new()),
        })
    }

    pub fn with_evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn client(&self) -> &MaileonClient<T> {
        &self.client
    }

    /// Run the node over `records`, producing one output record per input
    pub async fn execute(&self, records: &[Value]) -> Result<Vec<Value>, NodeError> {
        self.client.heartbeat().await;

        let mut output = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            debug!("Processing record {index} ({})", self.config.operation());
            let result = self
                .process(record)
                .await
                .map_err(|e| NodeError::at(index, e))?;
            output.push(result);
        }
        Ok(output)
    }

    async fn process(&self, record: &Value) -> Result<Value, MaileonError> {
        let evaluator = self.evaluator.as_ref();

        match &self.config {
            OperationConfig::SendContact(contact) => {
                let upsert = contact.resolve(evaluator, record)?;
                let ensured = upsert_contact(&self.client, &upsert, evaluator, record).await?;
                Ok(ensured.response)
            }
            OperationConfig::SendContactEvent(contact, event) => {
                let upsert = contact.resolve(evaluator, record)?;
                let event_type = event.resolve_type(evaluator, record)?;
                let ensured = upsert_contact(&self.client, &upsert, evaluator, record).await?;
                dispatch_event(
                    &self.client,
                    &ensured,
                    &event_type,
                    &event.fields,
                    evaluator,
                    record,
                )
                .await
            }
            OperationConfig::UnsubscribeContact(config) => {
                let (identity, mailing_id) = config.resolve(evaluator, record)?;
                unsubscribe(&self.client, &identity, mailing_id.as_deref()).await
            }
        }
    }
}
