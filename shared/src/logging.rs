//! Shared logging utilities for consistent tracing across the orchestration engine

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::types::WorkerKind;

/// Per-crate filter directive for the given base level
pub fn filter_directive(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("orchestrator={base_level},shared={base_level}")
}

/// Initialize the stdout tracing subscriber with an optional log level
///
/// `RUST_LOG` takes precedence over the level passed in when it is set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    // A subscriber may already be installed (tests, embedding applications)
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for node-aware info logging
#[macro_export]
macro_rules! node_info {
    ($node:expr, $($arg:tt)*) => {
        tracing::info!(
            node = %$node,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for node-aware warning logging
#[macro_export]
macro_rules! node_warn {
    ($node:expr, $($arg:tt)*) => {
        tracing::warn!(
            node = %$node,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for node-aware error logging
#[macro_export]
macro_rules! node_error {
    ($node:expr, $($arg:tt)*) => {
        tracing::error!(
            node = %$node,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for node-aware debug logging
#[macro_export]
macro_rules! node_debug {
    ($node:expr, $($arg:tt)*) => {
        tracing::debug!(
            node = %$node,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(node: WorkerKind, details: &str) {
    info!(
        node = %node,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(node: WorkerKind, reason: &str) {
    info!(
        node = %node,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(node: WorkerKind, context: &str, error: &dyn std::fmt::Display) {
    error!(
        node = %node,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(node: WorkerKind, message: &str) {
    info!(
        node = %node,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}
