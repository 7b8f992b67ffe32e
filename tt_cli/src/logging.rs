//! Structured logging configuration.
//!
//! Logs go to stderr so that stdout stays clean JSON. Engine records emitted
//! through `log` are bridged into the same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Levels are configurable via the `RUST_LOG` env var; the default keeps
/// engine chatter at `warn`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tt_engine=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Log the result of one engine command with structured fields
pub fn log_command(command: &str, deltas: usize, duration_us: u128) {
    if deltas == 0 {
        tracing::info!(command = command, duration_us = duration_us, "No changes");
    } else {
        tracing::info!(
            command = command,
            deltas = deltas,
            duration_us = duration_us,
            "Command applied"
        );
    }
}

/// Log a business-rule rejection, which is not a host failure
pub fn log_rejection(command: &str, reason: &str) {
    tracing::warn!(command = command, reason = reason, "REJECTED");
}
