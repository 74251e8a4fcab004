//! Logging setup for the `strata` binary.
//!
//! Logs go to stderr so they never mix with command output.
//!
//! # Environment Variables
//!
//! - `STRATA_DEBUG=true|1|yes` - Enable debug logging
//! - `STRATA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `STRATA_LOG_FORMAT=compact|pretty|json` - Output format (default: compact)
//!
//! Nothing is installed unless one of the first two is set.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Crates whose events pass the filter.
const TARGETS: &[&str] = &["strata", "strata_cli", "strata_migrate", "strata_sqlite"];

/// Check if `STRATA_DEBUG` is enabled.
pub fn is_debug_enabled() -> bool {
    env::var("STRATA_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Resolve the log level from `STRATA_LOG_LEVEL`, falling back to
/// `debug` under `STRATA_DEBUG` and `warn` otherwise.
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("STRATA_LOG_LEVEL") {
        Ok(level) => parse_level(&level).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn parse_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Resolve the output format from `STRATA_LOG_FORMAT`.
pub fn log_format() -> &'static str {
    env::var("STRATA_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "json" => "json",
            _ => "compact",
        })
        .unwrap_or("compact")
}

fn filter_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("STRATA_LOG_LEVEL").is_err() {
            return;
        }

        let level = log_level();
        let filter =
            EnvFilter::try_new(filter_directives(level)).unwrap_or_else(|_| EnvFilter::new("warn"));
        let registry = tracing_subscriber::registry().with(filter);

        match log_format() {
            "json" => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
            "pretty" => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init(),
            _ => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init(),
        }

        tracing::debug!(level, format = log_format(), "Strata logging initialized");
    });
}
