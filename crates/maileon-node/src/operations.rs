//! Contact upsert, event dispatch and unsubscribe
//!
//! Event dispatch takes an [`EnsuredContact`], which only [`upsert_contact`]
//! produces, so an event can never be sent for a contact that was not
//! upserted first in the same record.

use crate::params::ContactUpsert;
use maileon_core::client::MAILEON_JSON;
use maileon_core::mapping::{ContactFields, resolve_contact_fields, resolve_event_attributes};
use maileon_core::template::ExpressionEvaluator;
use maileon_core::{
    ApiRequest, ContactIdentity, FieldMapping, FieldSchema, MaileonClient, MaileonError,
    Permission, Transport,
};
use serde_json::{Value, json};
use tracing::{info, warn};

pub const NOT_QUEUED_FALLBACK: &str = "Failed to queue Maileon transaction.";
pub const UNSUBSCRIBED_MESSAGE: &str = "Unsubscribed successfully";

/// Proof that a contact was upserted during this record's processing
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredContact {
    pub email: String,
    /// Upsert response body
    pub response: Value,
}

/// Build the upsert request for resolved contact fields.
///
/// Query order is fixed: `permission`, `sync_mode`, then `doi`/`doiplus`
/// (permission 1 with doi requested), `doimailing` (non-empty key), `src`.
pub fn build_upsert_request(upsert: &ContactUpsert, fields: ContactFields) -> ApiRequest {
    let mut request = ApiRequest::post(upsert.identity.path())
        .query("permission", u8::from(upsert.permission).to_string())
        .query("sync_mode", u8::from(upsert.sync_mode).to_string());

    if upsert.doi && upsert.permission == Permission::None {
        request = request.query("doi", "true").query("doiplus", "true");
    }
    if let Some(doi_key) = &upsert.doi_key {
        request = request.query("doimailing", doi_key.clone());
    }
    if let Some(src) = &upsert.src {
        request = request.query("src", src.clone());
    }

    let body = json!({
        "email": upsert.identity.email,
        "standard_fields": fields.standard_fields,
        "custom_fields": fields.custom_fields,
    });
    request.json(body, MAILEON_JSON)
}

/// Create or update a contact. The custom-field schema is fetched on every call.
pub async fn upsert_contact<T: Transport>(
    client: &MaileonClient<T>,
    upsert: &ContactUpsert,
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<EnsuredContact, MaileonError> {
    let custom = client.custom_fields().await?;
    let fields = resolve_contact_fields(
        &upsert.fields,
        &FieldSchema::standard_contact(),
        &custom,
        evaluator,
        record,
    )?;

    let request = build_upsert_request(upsert, fields);
    let response = client.send(request).await?;
    info!("Upserted contact {}", upsert.identity.path());

    Ok(EnsuredContact {
        email: upsert.identity.email.clone(),
        response: response.json_value(),
    })
}

/// Transactions body for a single event
pub fn transaction_batch(
    event_type: &str,
    email: &str,
    attributes: serde_json::Map<String, Value>,
) -> Value {
    json!([{
        "typeName": event_type,
        "contact": { "email": email },
        "content": attributes,
    }])
}

/// Business-level acknowledgement: `reports[0].queued` must be `true`
pub fn check_queued(response: &Value) -> Result<(), MaileonError> {
    let report = response
        .get("reports")
        .and_then(|r| r.get(0))
        .cloned()
        .unwrap_or(Value::Null);

    if report.get("queued") == Some(&Value::Bool(true)) {
        return Ok(());
    }

    let message = report
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(NOT_QUEUED_FALLBACK)
        .to_string();
    Err(MaileonError::NotQueued { message, report })
}

/// Send one event for an upserted contact and return the transactions response
pub async fn dispatch_event<T: Transport>(
    client: &MaileonClient<T>,
    contact: &EnsuredContact,
    event_type: &str,
    mappings: &[FieldMapping],
    evaluator: &dyn ExpressionEvaluator,
    record: &Value,
) -> Result<Value, MaileonError> {
    let schema = client.transaction_type(event_type).await?;
    let attributes = resolve_event_attributes(mappings, evaluator, record)?;

    let missing: Vec<&str> = schema
        .mandatory()
        .filter(|f| !attributes.contains_key(&f.name))
        .map(|f| f.name.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(
            "Event '{event_type}' is missing mandatory attributes: {}",
            missing.join(", ")
        );
    }

    let response = client
        .send_transactions(transaction_batch(event_type, &contact.email, attributes))
        .await?;
    check_queued(&response)?;
    info!("Queued '{event_type}' event for {}", contact.email);

    Ok(response)
}

/// Unsubscribe a contact, optionally from a single mailing
pub async fn unsubscribe<T: Transport>(
    client: &MaileonClient<T>,
    identity: &ContactIdentity,
    mailing_id: Option<&str>,
) -> Result<Value, MaileonError> {
    let response = client.unsubscribe(identity, mailing_id).await?;
    info!("Unsubscribed {}", identity.path());

    Ok(json!({
        "success": true,
        "message": UNSUBSCRIBED_MESSAGE,
        "response": response.json_value(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maileon_core::mock::MockTransport;
    use maileon_core::template::LiteralEvaluator;
    use maileon_core::{Method, SyncMode};

    fn upsert(permission: Permission, doi: bool, doi_key: Option<&str>) -> ContactUpsert {
        ContactUpsert {
            identity: ContactIdentity::email("jane@example.com"),
            src: None,
            permission,
            sync_mode: SyncMode::Update,
            doi,
            doi_key: doi_key.map(str::to_string),
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_doi_query_at_permission_none() {
        let request = build_upsert_request(
            &upsert(Permission::None, true, Some("k1")),
            ContactFields::default(),
        );
        assert_eq!(
            request.query_string(),
            "permission=1&sync_mode=1&doi=true&doiplus=true&doimailing=k1"
        );
        assert_eq!(request.path(), "/contacts/email/jane%40example.com");
        assert_eq!(request.content_type, Some(MAILEON_JSON));
    }

    #[test]
    fn test_doi_ignored_above_permission_none() {
        let request = build_upsert_request(
            &upsert(Permission::SingleOptIn, true, None),
            ContactFields::default(),
        );
        assert_eq!(request.query_string(), "permission=2&sync_mode=1");
        assert_eq!(request.query_value("doi"), None);
        assert_eq!(request.query_value("doiplus"), None);
    }

    #[test]
    fn test_doi_key_sent_without_doi_flag() {
        let request = build_upsert_request(
            &upsert(Permission::None, false, Some("k2")),
            ContactFields::default(),
        );
        assert_eq!(request.query_string(), "permission=1&sync_mode=1&doimailing=k2");
    }

    #[test]
    fn test_upsert_body_and_src() {
        let mut contact = upsert(Permission::ConfirmedOptIn, false, None);
        contact.src = Some("landing-page".to_string());
        contact.sync_mode = SyncMode::Ignore;
        contact.identity = contact.identity.with_external_id("crm-7");

        let mut fields = ContactFields::default();
        fields.standard_fields.insert("FIRSTNAME".to_string(), json!("Jane"));
        fields.custom_fields.insert("vip".to_string(), json!(true));

        let request = build_upsert_request(&contact, fields);
        assert_eq!(request.path(), "/contacts/externalid/crm-7");
        assert_eq!(request.query_string(), "permission=3&sync_mode=2&src=landing-page");
        assert_eq!(
            request.body,
            Some(json!({
                "email": "jane@example.com",
                "standard_fields": {"FIRSTNAME": "Jane"},
                "custom_fields": {"vip": true}
            }))
        );
    }

    #[test]
    fn test_check_queued() {
        assert!(check_queued(&json!({"reports": [{"queued": true}]})).is_ok());

        let err = check_queued(&json!({"reports": [{"queued": false, "message": "type unknown"}]}))
            .unwrap_err();
        assert_eq!(err.to_string(), "type unknown");

        let err = check_queued(&json!({"reports": []})).unwrap_err();
        assert_eq!(err.to_string(), NOT_QUEUED_FALLBACK);

        // Truthy non-boolean values do not count
        assert!(check_queued(&json!({"reports": [{"queued": "true"}]})).is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_output_record() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Delete,
            "/contacts/email/jane%40example.com/unsubscribe",
            200,
            "",
        );
        let client = MaileonClient::new(transport);

        let output = unsubscribe(&client, &ContactIdentity::email("jane@example.com"), None)
            .await
            .unwrap();
        assert_eq!(
            output,
            json!({"success": true, "message": "Unsubscribed successfully", "response": {}})
        );
    }

    #[tokio::test]
    async fn test_event_not_queued_after_upsert() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/transactions/types/order", 200, "<transaction_type/>");
        transport.respond(
            Method::Post,
            "/transactions",
            201,
            r#"{"reports":[{"queued":false}]}"#,
        );
        let client = MaileonClient::new(transport.clone());
        let contact = EnsuredContact {
            email: "jane@example.com".to_string(),
            response: json!({}),
        };

        let err = dispatch_event(
            &client,
            &contact,
            "order",
            &[FieldMapping::new("id", "A1")],
            &LiteralEvaluator,
            &json!({}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MaileonError::NotQueued { .. }));

        let posted = transport.calls_to(Method::Post, "/transactions");
        assert_eq!(
            posted[0].body,
            Some(json!([{
                "typeName": "order",
                "contact": {"email": "jane@example.com"},
                "content": {"id": "A1"}
            }]))
        );
    }

    #[tokio::test]
    async fn test_event_with_empty_transactions_reply_is_not_queued() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/transactions/types/order", 200, "<transaction_type/>");
        transport.respond(Method::Post, "/transactions", 201, "");
        let client = MaileonClient::new(transport);
        let contact = EnsuredContact {
            email: "jane@example.com".to_string(),
            response: json!({}),
        };

        let err = dispatch_event(&client, &contact, "order", &[], &LiteralEvaluator, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, MaileonError::NotQueued { .. }));
        assert_eq!(err.to_string(), NOT_QUEUED_FALLBACK);
    }
}
