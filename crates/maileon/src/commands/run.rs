//! Run command: execute a node over input records

use anyhow::{Context as _, Result, bail};
use clap::Args;
use maileon_node::{MaileonNode, NodeParameters};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use super::GlobalArgs;
use crate::context::{Context, parse_json_input, print_json, read_input};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Node parameters (TOML, or JSON for a `.json` file)
    #[arg(long)]
    params: PathBuf,

    /// Input records as a JSON array or single object (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,
}

fn load_params(path: &Path) -> Result<NodeParameters> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameters {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let params = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid parameters in {}", path.display()))?
    } else {
        toml::from_str(&raw).with_context(|| format!("invalid parameters in {}", path.display()))?
    };
    Ok(params)
}

fn records(input: Value) -> Result<Vec<Value>> {
    match input {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Ok(vec![input]),
        Value::Null => Ok(Vec::new()),
        other => bail!("input must be a JSON array or object, got {other}"),
    }
}

pub async fn execute(global: &GlobalArgs, args: RunArgs) -> Result<()> {
    let params = load_params(&args.params)?;
    // Reject bad parameters before reading input or touching the network
    params.validate()?;

    let records = records(parse_json_input(&read_input(args.input.as_deref())?)?)?;

    info!("Running {} over {} record(s)", params.operation, records.len());
    let ctx = Context::load(global.overrides())?;
    let node = MaileonNode::new(ctx.client()?, &params)?;
    let output = node.execute(&records).await?;

    print_json(&output)
}
