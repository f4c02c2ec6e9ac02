//! Structured logging setup for confscout
//!
//! Logs go to stderr so that `--format json` output on stdout stays parseable.
//!
//! # Example
//!
//! ```no_run
//! use confscout::util::logging::{init_logging, LoggingConfig};
//! use tracing::{debug, info};
//!
//! init_logging(LoggingConfig::from_env());
//!
//! info!("Collection started");
//! debug!(root = "/mnt/image", "Walking filesystem");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for confscout's own events
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., confscout::finder) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations and thread ids
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Reads `CONFSCOUT_LOG_LEVEL` and `CONFSCOUT_LOG_JSON`; JSON output uses the
    /// production preset
    pub fn from_env() -> Self {
        let use_json = env::var("CONFSCOUT_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);
        let base = if use_json {
            Self::production()
        } else {
            Self::default()
        };
        match env::var("CONFSCOUT_LOG_LEVEL") {
            Ok(level) => Self {
                level: parse_level(&level),
                ..base
            },
            Err(_) => base,
        }
    }
}

/// Parses a log level, case-insensitively; unknown values fall back to `INFO`
///
/// ```
/// use confscout::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Builds the filter: `RUST_LOG` directives plus `confscout=<level>`
fn build_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("confscout={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_presets() {
        let default = LoggingConfig::default();
        assert_eq!(default.level, Level::INFO);
        assert!(!default.use_json);

        let production = LoggingConfig::production();
        assert!(production.use_json);
        assert!(production.include_location);

        assert_eq!(LoggingConfig::with_level(Level::WARN).level, Level::WARN);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        let old_level = env::var("CONFSCOUT_LOG_LEVEL").ok();
        let old_json = env::var("CONFSCOUT_LOG_JSON").ok();
        env::set_var("CONFSCOUT_LOG_LEVEL", "trace");
        env::set_var("CONFSCOUT_LOG_JSON", "true");

        let config = LoggingConfig::from_env();
        env::remove_var("CONFSCOUT_LOG_JSON");
        let plain = LoggingConfig::from_env();

        match old_level {
            Some(v) => env::set_var("CONFSCOUT_LOG_LEVEL", v),
            None => env::remove_var("CONFSCOUT_LOG_LEVEL"),
        }
        match old_json {
            Some(v) => env::set_var("CONFSCOUT_LOG_JSON", v),
            None => env::remove_var("CONFSCOUT_LOG_JSON"),
        }

        assert_eq!(config.level, Level::TRACE);
        assert!(config.use_json);
        assert!(config.include_location);
        assert_eq!(plain.level, Level::TRACE);
        assert!(!plain.use_json);
        assert!(!plain.include_location);
    }
}
