//! Ping command: credential test

use anyhow::Result;

use super::GlobalArgs;
use crate::context::Context;

pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = Context::load(global.overrides())?;
    ctx.client()?.ping().await?;
    println!("Maileon API reachable at {}", ctx.config.api.base_url());
    Ok(())
}
