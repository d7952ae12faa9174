//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use maileon_core::config::ConfigOverrides;
use std::path::PathBuf;

mod options;
mod ping;
mod receive;
mod run;
mod webhook;

/// maileon - Maileon email-marketing connector
#[derive(Parser, Debug)]
#[command(
    name = "maileon",
    version,
    about = "Maileon email-marketing connector",
    long_about = "Sync contacts, send contact events and unsubscribes to Maileon, and manage webhook triggers"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Additional config file, layered above the discovered ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maileon API key (overrides MAILEON_API_KEY and config files)
    #[arg(long, global = true)]
    api_key: Option<String>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            config_path: self.config.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a node over a JSON array of input records
    Run(run::RunArgs),

    /// List dynamic option values (contact fields, event types, event fields)
    Options(options::OptionsArgs),

    /// Manage the webhook trigger registration
    Webhook(webhook::WebhookArgs),

    /// Turn an inbound webhook delivery into an output record
    Receive(receive::ReceiveArgs),

    /// Check the configured API key against Maileon
    Ping,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run::execute(&self.global, args).await,
            Commands::Options(args) => options::execute(&self.global, args).await,
            Commands::Webhook(args) => webhook::execute(&self.global, args).await,
            Commands::Receive(args) => receive::execute(&self.global, args),
            Commands::Ping => ping::execute(&self.global).await,
        }
    }
}
