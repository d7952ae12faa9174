//! Webhook command: trigger registration lifecycle

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use maileon_core::config::ConfigOverrides;
use maileon_core::{JsonFileStore, WebhookEvent};
use maileon_node::{RegistrationState, WebhookRegistrar, registration_state};
use serde_json::{Value, json};
use tracing::info;

use super::GlobalArgs;
use crate::context::{Context, print_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WebhookAction {
    /// Show the locally recorded registration
    Status,
    /// Look for a matching remote webhook and record it
    Check,
    /// Register a new webhook
    Create,
    /// Remove the recorded webhook (no-op when none is recorded)
    Delete,
}

#[derive(Args, Debug)]
pub struct WebhookArgs {
    action: WebhookAction,

    /// Event to subscribe to: doi, unsubscription or bounce
    #[arg(long)]
    event: Option<WebhookEvent>,

    /// Callback URL Maileon delivers to (overrides MAILEON_WEBHOOK_URL)
    #[arg(long)]
    url: Option<String>,
}

fn status_report(state: RegistrationState) -> Value {
    match state {
        RegistrationState::Absent => json!({"state": "absent"}),
        RegistrationState::Registered { id } => json!({"state": "registered", "id": id}),
    }
}

pub async fn execute(global: &GlobalArgs, args: WebhookArgs) -> Result<()> {
    let ctx = Context::load(ConfigOverrides {
        event: args.event,
        webhook_url: args.url.clone(),
        ..global.overrides()
    })?;

    let trigger = &ctx.config.trigger;
    let state_file = trigger.state_file(&ctx.home_dir);

    // Status is answered from the state file alone; no credentials needed
    if args.action == WebhookAction::Status {
        let store = JsonFileStore::new(state_file);
        return print_json(&status_report(registration_state(&store, trigger.node_id())?));
    }

    let url = trigger.webhook_url.clone().unwrap_or_default();
    if matches!(args.action, WebhookAction::Check | WebhookAction::Create) && url.is_empty() {
        bail!(
            "No webhook URL configured (pass --url, set MAILEON_WEBHOOK_URL, or add [trigger] webhook_url)"
        );
    }

    info!(
        "Webhook {:?} for {} ({} event)",
        args.action,
        trigger.node_id(),
        trigger.event()
    );
    let registrar = WebhookRegistrar::new(
        ctx.client()?,
        JsonFileStore::new(state_file),
        trigger.node_id(),
        trigger.event(),
        url,
    );

    let report = match args.action {
        WebhookAction::Check => json!({"exists": registrar.check_exists().await?}),
        WebhookAction::Create => json!({"id": registrar.create().await?}),
        WebhookAction::Delete => json!({"deleted": registrar.delete().await?}),
        WebhookAction::Status => status_report(registrar.state()?),
    };
    print_json(&report)
}
