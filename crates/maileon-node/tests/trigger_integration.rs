//! Webhook registration lifecycle with a file-backed store

use maileon_core::mock::MockTransport;
use maileon_core::{JsonFileStore, KeyValueStore, MaileonClient, Method, WebhookEvent};
use maileon_node::{RegistrationState, WebhookRegistrar};
use serde_json::json;
use tempfile::TempDir;

const HOOK_URL: &str = "https://hooks.example.com/maileon/bounce";

#[tokio::test]
async fn lifecycle_survives_restarts() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    let transport = MockTransport::new();
    transport.respond(Method::Get, "/webhooks", 200, "[]");
    transport.respond(Method::Post, "/webhooks", 201, r#"{"id": 314}"#);
    transport.respond(Method::Delete, "/webhooks/314", 200, "");

    let registrar = |store: JsonFileStore| {
        WebhookRegistrar::new(
            MaileonClient::new(transport.clone()),
            store,
            "shop",
            WebhookEvent::Bounce,
            HOOK_URL,
        )
    };

    let first = registrar(JsonFileStore::new(&state));
    assert!(!first.check_exists().await.unwrap());
    assert_eq!(first.create().await.unwrap(), "314");

    let second = registrar(JsonFileStore::new(&state));
    assert_eq!(
        second.state().unwrap(),
        RegistrationState::Registered { id: "314".to_string() }
    );
    assert!(second.delete().await.unwrap());
    assert!(second.delete().await.unwrap());
    assert_eq!(transport.count(Method::Delete, "/webhooks/314"), 1);

    let created = transport.calls_to(Method::Post, "/webhooks");
    assert_eq!(
        created[0].body,
        Some(json!({
            "event": "bounce",
            "url": HOOK_URL,
            "standardFields": ["email", "external_id"]
        }))
    );
    assert_eq!(JsonFileStore::new(&state).get("shop.webhookId").unwrap(), None);
}
