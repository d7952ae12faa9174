//! maileon - command-line host for the Maileon connector
//!
//! Runs contact/event/unsubscribe operations over JSON records, lists the
//! dynamic option values, and manages the webhook trigger registration.

use clap::Parser;
use maileon_core::logging;

mod commands;
mod context;

use commands::Cli;

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
