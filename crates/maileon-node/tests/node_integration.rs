//! End-to-end node runs against the recording transport

use maileon_core::mock::MockTransport;
use maileon_core::{CoercionError, MaileonClient, MaileonError, Method};
use maileon_node::{MaileonNode, NodeParameters};
use serde_json::{Value, json};

const CUSTOM_FIELDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<custom_fields>
  <custom_field><name>loyalty_points</name><type>integer</type></custom_field>
  <custom_field><name>signup_date</name><type>date</type></custom_field>
</custom_fields>"#;

const ORDER_TYPE: &str = r#"<transaction_type>
  <name>order_placed</name>
  <attributes>
    <attribute><name>order_id</name><type>string</type><mandatory>true</mandatory></attribute>
    <attribute><name>total</name><type>float</type><mandatory>false</mandatory></attribute>
  </attributes>
</transaction_type>"#;

fn node(transport: &MockTransport, params: Value) -> MaileonNode<MockTransport> {
    let params: NodeParameters = serde_json::from_value(params).unwrap();
    let client = MaileonClient::new(transport.clone()).with_heartbeat_url(None);
    MaileonNode::new(client, &params).unwrap()
}

fn contact_record(email: &str, points: &str) -> Value {
    json!({"email": email, "first": "Jo", "points": points, "joined": "2024-01-02"})
}

fn contact_params() -> Value {
    json!({
        "operation": "sendContact",
        "email": "{{ email }}",
        "permission": 1,
        "doi": true,
        "doi_key": "k1",
        "contact_fields": [
            {"field": "FIRSTNAME", "value": "{{ first }}"},
            {"field": "loyalty_points", "value": "{{ points }}"},
            {"field": "signup_date", "value": "{{ joined }}"},
            {"field": "not_a_field", "value": "dropped"}
        ]
    })
}

#[tokio::test]
async fn send_contact_builds_typed_upsert() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, CUSTOM_FIELDS);
    transport.respond(Method::Post, "/contacts/email/jane%40example.com", 201, "");

    let output = node(&transport, contact_params())
        .execute(&[json!({
            "email": "jane@example.com",
            "first": "Jane",
            "points": "120",
            "joined": "2024-02-15T18:00:00Z"
        })])
        .await
        .unwrap();
    assert_eq!(output, vec![json!({})]);

    let upserts = transport.calls_to(Method::Post, "/contacts/email/jane%40example.com");
    assert_eq!(upserts.len(), 1);
    assert_eq!(
        upserts[0].query_string(),
        "permission=1&sync_mode=1&doi=true&doiplus=true&doimailing=k1"
    );
    assert_eq!(
        upserts[0].body,
        Some(json!({
            "email": "jane@example.com",
            "standard_fields": {"FIRSTNAME": "Jane"},
            "custom_fields": {"loyalty_points": 120, "signup_date": "2024-02-15"}
        }))
    );
}

#[tokio::test]
async fn custom_fields_are_refetched_per_record() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, CUSTOM_FIELDS);
    transport.respond(Method::Post, "/contacts/email/a%40x.io", 200, r#"{"ok":1}"#);
    transport.respond(Method::Post, "/contacts/email/b%40x.io", 200, "created");

    let output = node(&transport, contact_params())
        .execute(&[contact_record("a@x.io", "1"), contact_record("b@x.io", "2")])
        .await
        .unwrap();

    assert_eq!(output, vec![json!({"ok": 1}), json!("created")]);
    assert_eq!(transport.count(Method::Get, "/contacts/fields/custom"), 2);
}

#[tokio::test]
async fn first_failing_record_aborts_the_batch() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, CUSTOM_FIELDS);
    transport.respond(Method::Post, "/contacts/email/a%40x.io", 200, "");
    transport.respond(Method::Post, "/contacts/email/c%40x.io", 200, "");

    let err = node(&transport, contact_params())
        .execute(&[
            contact_record("a@x.io", "5"),
            contact_record("b@x.io", "12.9"),
            contact_record("c@x.io", "7"),
        ])
        .await
        .unwrap_err();

    assert_eq!(err.item_index, Some(1));
    assert_eq!(err.message, "Invalid integer: 12.9");
    assert!(matches!(
        err.source,
        Some(MaileonError::Coercion(CoercionError::InvalidInteger(_)))
    ));
    assert_eq!(transport.count(Method::Post, "/contacts/email/c%40x.io"), 0);
}

#[tokio::test]
async fn api_errors_surface_verbatim() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, CUSTOM_FIELDS);
    transport.respond(
        Method::Post,
        "/contacts/email/a%40x.io",
        400,
        "<error><message>invalid permission</message></error>",
    );

    let err = node(&transport, contact_params())
        .execute(&[contact_record("a@x.io", "3")])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.message.contains("<message>invalid permission</message>"));
}

fn event_params() -> Value {
    json!({
        "operation": "sendContactEvent",
        "email": "{{ email }}",
        "event_type": "order_placed",
        "event_fields": [
            {"field": "order_id", "value": "{{ order.id }}"},
            {"field": "total", "value": "{{ order.total }}"},
            {"field": "coupon", "value": ""}
        ]
    })
}

#[tokio::test]
async fn send_event_upserts_before_dispatch() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, "<custom_fields/>");
    transport.respond(Method::Post, "/contacts/email/jane%40example.com", 200, "");
    transport.respond(Method::Get, "/transactions/types/order_placed", 200, ORDER_TYPE);
    let ack = json!({"reports": [{"queued": true, "contact": {"email": "jane@example.com"}}]});
    transport.respond(Method::Post, "/transactions", 201, ack.to_string());

    let output = node(&transport, event_params())
        .execute(&[json!({"email": "jane@example.com", "order": {"id": "A-17", "total": 19.5}})])
        .await
        .unwrap();
    assert_eq!(output, vec![ack]);

    let calls = transport.get_calls();
    let paths: Vec<_> = calls.iter().map(|c| (c.method, c.path().to_string())).collect();
    assert_eq!(
        paths,
        vec![
            (Method::Get, "/contacts/fields/custom".to_string()),
            (Method::Post, "/contacts/email/jane%40example.com".to_string()),
            (Method::Get, "/transactions/types/order_placed".to_string()),
            (Method::Post, "/transactions".to_string()),
        ]
    );
    assert_eq!(
        calls[3].body,
        Some(json!([{
            "typeName": "order_placed",
            "contact": {"email": "jane@example.com"},
            "content": {"order_id": "A-17", "total": 19.5}
        }]))
    );
}

#[tokio::test]
async fn event_without_queued_ack_fails_with_vendor_message() {
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/contacts/fields/custom", 200, "");
    transport.respond(Method::Post, "/contacts/email/jane%40example.com", 200, "");
    transport.respond(Method::Get, "/transactions/types/order_placed", 200, ORDER_TYPE);
    transport.respond(
        Method::Post,
        "/transactions",
        201,
        r#"{"reports":[{"queued":false,"message":"contact not found"}]}"#,
    );

    let err = node(&transport, event_params())
        .execute(&[json!({"email": "jane@example.com", "order": {"id": "A-1"}})])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "contact not found");
    assert!(matches!(err.source, Some(MaileonError::NotQueued { .. })));
}

#[tokio::test]
async fn unsubscribe_by_external_id_scoped_to_mailing() {
    let transport = MockTransport::new();
    transport.respond(
        Method::Delete,
        "/contacts/externalid/crm-42/unsubscribe",
        200,
        "",
    );

    let output = node(
        &transport,
        json!({
            "operation": "unsubscribeContact",
            "email": "jane@example.com",
            "external_id": "{{ crm }}",
            "mailing_id": "311"
        }),
    )
    .execute(&[json!({"crm": "crm-42"})])
    .await
    .unwrap();

    assert_eq!(output[0]["message"], json!("Unsubscribed successfully"));
    let calls = transport.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].query_string(), "mailingId=311");
}

#[tokio::test]
async fn heartbeat_failure_does_not_block_the_run() {
    let transport = MockTransport::new();
    transport.fail(
        Method::Get,
        maileon_core::client::DEFAULT_HEARTBEAT_URL,
        "dns failure",
    );
    transport.respond(Method::Delete, "/contacts/email/a%40x.io/unsubscribe", 200, "");

    let params: NodeParameters = serde_json::from_value(json!({
        "operation": "unsubscribeContact",
        "email": "a@x.io"
    }))
    .unwrap();
    let node = MaileonNode::new(MaileonClient::new(transport.clone()), &params).unwrap();

    let output = node.execute(&[json!({})]).await.unwrap();
    assert_eq!(output.len(), 1);
    assert_eq!(transport.get_calls().len(), 2);
}
