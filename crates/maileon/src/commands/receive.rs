//! Receive command: inbound webhook pass-through

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use maileon_core::WebhookEvent;
use maileon_core::config::ConfigOverrides;
use maileon_node::webhook_record;
use std::path::PathBuf;

use super::GlobalArgs;
use crate::context::{Context, parse_json_input, print_json, read_input};

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Event type the webhook was registered for (default: [trigger] event)
    #[arg(long)]
    event: Option<WebhookEvent>,

    /// Delivered request body (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,
}

pub fn execute(global: &GlobalArgs, args: ReceiveArgs) -> Result<()> {
    let ctx = Context::load(ConfigOverrides {
        event: args.event,
        ..global.overrides()
    })?;
    let body = parse_json_input(&read_input(args.input.as_deref())?)?;

    print_json(&webhook_record(ctx.config.trigger.event(), body, Utc::now()))
}
