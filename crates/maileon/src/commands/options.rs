//! Options command: list dynamic dropdown values

use anyhow::Result;
use clap::Args;
use maileon_node::{OptionField, list_options};

use super::GlobalArgs;
use crate::context::{Context, print_json};

#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// contact-fields, event-types or event-fields
    field: OptionField,

    /// Event type whose attributes to list (event-fields only)
    #[arg(long)]
    event_type: Option<String>,
}

pub async fn execute(global: &GlobalArgs, args: OptionsArgs) -> Result<()> {
    let ctx = Context::load(global.overrides())?;
    let client = ctx.client()?;
    let entries = list_options(&client, args.field, args.event_type.as_deref()).await?;
    print_json(&entries)
}
