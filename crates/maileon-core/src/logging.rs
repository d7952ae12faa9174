//! Process-level tracing setup shared by the connector binaries.

use std::sync::OnceLock;

static INIT: OnceLock<()> = OnceLock::new();

pub const LOG_ENV: &str = "MAILEON_LOG";

fn parse_level(raw: Option<&str>) -> tracing::Level {
    match raw.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Initialize tracing from `MAILEON_LOG` (default `info`), writing to stderr.
///
/// Stdout carries command output, so logs never go there. Repeated calls are no-ops.
pub fn init() {
    if INIT.get().is_some() {
        return;
    }
    let level = parse_level(std::env::var(LOG_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = INIT.set(());
}
