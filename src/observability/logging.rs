//! Logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_FILTER_ENV: &str = "NETBOX_MCP_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Log file, or `None` for stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the logging configuration.
    ///
    /// The filter comes from `NETBOX_MCP_LOG`, then `RUST_LOG`, then the
    /// configured directive, then `debug`/`info` depending on `verbose`.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let directive = std::env::var(LOG_FILTER_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .or_else(|| settings.filter.clone())
            .unwrap_or_else(|| default_directive(verbose).to_string());

        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("Invalid log filter '{directive}': {e}; using default");
            EnvFilter::new(default_directive(verbose))
        });

        Self {
            format: settings
                .format
                .as_deref()
                .map(LogFormat::parse)
                .unwrap_or_default(),
            filter,
            file: settings.file.clone(),
        }
    }
}

const fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
    }

    #[test]
    fn test_from_settings_keeps_file_and_format() {
        let settings = LoggingSettings {
            format: Some("json".to_string()),
            filter: Some("warn".to_string()),
            file: None,
        };
        let config = LoggingConfig::from_settings(&settings, false);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file.is_none());
    }
}
