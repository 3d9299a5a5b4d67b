//! Logging infrastructure for SugarMeter.
//!
//! Logs go to stderr so command output on stdout stays clean. The filter
//! comes from `SUGARMETER_LOG`, then `RUST_LOG`, then the given default.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "SUGARMETER_LOG";

/// Initialize logging at WARN unless overridden
pub fn init() {
    init_with_level("warn")
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Default log level (debug, info, warn, error)
pub fn init_with_level(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

fn env_filter(default_level: &str) -> EnvFilter {
    directive_from(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        default_level,
    )
    .parse()
    .unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter: {}", e);
        EnvFilter::new(default_level)
    })
}

/// First non-empty directive in priority order
fn directive_from(app: Option<String>, rust_log: Option<String>, default_level: &str) -> String {
    [app, rust_log]
        .into_iter()
        .flatten()
        .find(|d| !d.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_variable_wins() {
        let d = directive_from(Some("sugar_core=debug".into()), Some("info".into()), "warn");
        assert_eq!(d, "sugar_core=debug");
    }

    #[test]
    fn test_falls_back_to_rust_log_then_default() {
        assert_eq!(directive_from(Some("  ".into()), Some("info".into()), "warn"), "info");
        assert_eq!(directive_from(None, None, "warn"), "warn");
    }
}
