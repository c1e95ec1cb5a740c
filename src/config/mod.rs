//! Configuration management.
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, then environment variables (a `.env` file is loaded into the
//! environment by the binary before any of this runs).
//!
//! ```toml
//! [netbox]
//! url = "https://netbox.example.com"
//! timeout_ms = 30000
//!
//! [trace]
//! default_max_iterations = 10
//!
//! [resources]
//! dir = "resources"
//! update_interval_hours = 24
//!
//! [logging]
//! format = "json"
//! ```

mod trace;

pub use trace::TraceSettings;

use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use trace::ConfigFileTrace;

/// Default log file name, created in the home directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "netbox_mcp_server.log";

/// Main configuration.
#[derive(Debug, Clone, Default)]
pub struct NetboxMcpConfig {
    /// NetBox connection.
    pub netbox: NetboxSettings,
    /// Tracer bounds.
    pub trace: TraceSettings,
    /// Reference-data cache.
    pub resources: ResourceSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

/// NetBox connection settings.
#[derive(Debug, Clone)]
pub struct NetboxSettings {
    /// Base URL of the NetBox instance.
    pub url: Option<String>,
    /// API token.
    pub token: Option<SecretString>,
    /// Per-request timeout in milliseconds (0 disables).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 disables).
    pub connect_timeout_ms: u64,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Maximum concurrent NetBox requests.
    pub max_concurrent_requests: usize,
    /// Wait for a request slot before giving up, in milliseconds.
    pub acquire_timeout_ms: u64,
}

impl Default for NetboxSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
            verify_tls: true,
            max_concurrent_requests: 8,
            acquire_timeout_ms: 5_000,
        }
    }
}

/// Reference-data cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSettings {
    /// Directory holding the JSON snapshot files.
    pub dir: PathBuf,
    /// Snapshot age after which a refresh is due.
    pub update_interval_hours: u64,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("resources"),
            update_interval_hours: 24,
        }
    }
}

/// Logging settings as read from file and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `json` or `pretty`.
    pub format: Option<String>,
    /// Filter directive (`info`, `netbox_mcp=debug`, ...).
    pub filter: Option<String>,
    /// Log file; `None` logs to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: None,
            filter: None,
            file: directories::BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(DEFAULT_LOG_FILE_NAME)),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `[netbox]` section.
    pub netbox: Option<ConfigFileNetbox>,
    /// `[trace]` section.
    pub trace: Option<ConfigFileTrace>,
    /// `[resources]` section.
    pub resources: Option<ConfigFileResources>,
    /// `[logging]` section.
    pub logging: Option<ConfigFileLogging>,
}

/// `[netbox]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileNetbox {
    /// Base URL.
    pub url: Option<String>,
    /// API token. Prefer `NETBOX_API_TOKEN` over storing it in the file.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// TLS verification.
    pub verify_tls: Option<bool>,
    /// Concurrency cap.
    pub max_concurrent_requests: Option<usize>,
    /// Slot wait.
    pub acquire_timeout_ms: Option<u64>,
}

/// `[resources]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileResources {
    /// Snapshot directory.
    pub dir: Option<String>,
    /// Refresh interval.
    pub update_interval_hours: Option<u64>,
}

/// `[logging]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Output format.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl NetboxMcpConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the platform config directory
    /// (`~/.config/netbox-mcp/config.toml` on Linux).
    ///
    /// Returns the default configuration if no file is found or it fails to
    /// parse.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from_file(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
            Self::default()
        })
    }

    /// Returns the platform config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("netbox-mcp").join("config.toml"))
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(netbox) = file.netbox {
            let settings = &mut config.netbox;
            settings.url = netbox.url.or(settings.url.take());
            if let Some(token) = netbox.token {
                settings.token = Some(SecretString::from(token));
            }
            if let Some(v) = netbox.timeout_ms {
                settings.timeout_ms = v;
            }
            if let Some(v) = netbox.connect_timeout_ms {
                settings.connect_timeout_ms = v;
            }
            if let Some(v) = netbox.verify_tls {
                settings.verify_tls = v;
            }
            if let Some(v) = netbox.max_concurrent_requests {
                settings.max_concurrent_requests = v.max(1);
            }
            if let Some(v) = netbox.acquire_timeout_ms {
                settings.acquire_timeout_ms = v;
            }
        }
        if let Some(trace) = file.trace {
            config.trace.apply_file(&trace);
        }
        if let Some(resources) = file.resources {
            if let Some(dir) = resources.dir {
                config.resources.dir = PathBuf::from(dir);
            }
            if let Some(v) = resources.update_interval_hours {
                config.resources.update_interval_hours = v;
            }
        }
        if let Some(logging) = file.logging {
            config.logging.format = logging.format.or(config.logging.format);
            config.logging.filter = logging.filter.or(config.logging.filter);
            if let Some(file) = logging.file {
                config.logging.file = non_empty(file).map(PathBuf::from);
            }
        }

        config
    }

    /// Applies process environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    ///
    /// | Variable | Setting |
    /// |----------|---------|
    /// | `NETBOX_URL` | `netbox.url` |
    /// | `NETBOX_API_TOKEN` | `netbox.token` |
    /// | `NETBOX_TIMEOUT_MS` | `netbox.timeout_ms` |
    /// | `NETBOX_CONNECT_TIMEOUT_MS` | `netbox.connect_timeout_ms` |
    /// | `NETBOX_VERIFY_TLS` | `netbox.verify_tls` |
    /// | `NETBOX_MAX_CONCURRENT_REQUESTS` | `netbox.max_concurrent_requests` |
    /// | `NETBOX_RESOURCES_DIR` | `resources.dir` |
    /// | `NETBOX_RESOURCE_UPDATE_INTERVAL_HOURS` | `resources.update_interval_hours` |
    /// | `NETBOX_MCP_LOG_FORMAT` | `logging.format` |
    /// | `NETBOX_MCP_LOG_FILE` | `logging.file` (empty for stderr) |
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("NETBOX_URL").and_then(non_empty) {
            self.netbox.url = Some(url);
        }
        if let Some(token) = lookup("NETBOX_API_TOKEN").and_then(non_empty) {
            self.netbox.token = Some(SecretString::from(token));
        }
        if let Some(v) = parse_env(&lookup, "NETBOX_TIMEOUT_MS") {
            self.netbox.timeout_ms = v;
        }
        if let Some(v) = parse_env(&lookup, "NETBOX_CONNECT_TIMEOUT_MS") {
            self.netbox.connect_timeout_ms = v;
        }
        if let Some(v) = lookup("NETBOX_VERIFY_TLS").and_then(|v| parse_bool(&v)) {
            self.netbox.verify_tls = v;
        }
        if let Some(v) = parse_env::<usize>(&lookup, "NETBOX_MAX_CONCURRENT_REQUESTS") {
            self.netbox.max_concurrent_requests = v.max(1);
        }
        if let Some(dir) = lookup("NETBOX_RESOURCES_DIR").and_then(non_empty) {
            self.resources.dir = PathBuf::from(dir);
        }
        if let Some(v) = parse_env(&lookup, "NETBOX_RESOURCE_UPDATE_INTERVAL_HOURS") {
            self.resources.update_interval_hours = v;
        }
        if let Some(format) = lookup("NETBOX_MCP_LOG_FORMAT").and_then(non_empty) {
            self.logging.format = Some(format);
        }
        if let Some(file) = lookup("NETBOX_MCP_LOG_FILE") {
            self.logging.file = non_empty(file).map(PathBuf::from);
        }
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    raw.trim().parse().map_or_else(
        |_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        },
        Some,
    )
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NetboxMcpConfig::new();
        assert!(config.netbox.url.is_none());
        assert!(config.netbox.token.is_none());
        assert_eq!(config.netbox.timeout_ms, 30_000);
        assert_eq!(config.resources.dir, PathBuf::from("resources"));
        assert_eq!(config.resources.update_interval_hours, 24);
        assert_eq!(config.trace.default_max_iterations, 10);
    }

    #[test]
    fn test_env_overrides() {
        let config = NetboxMcpConfig::new().with_overrides(lookup(&[
            ("NETBOX_URL", "https://netbox.example.com"),
            ("NETBOX_API_TOKEN", "abc123"),
            ("NETBOX_TIMEOUT_MS", "1500"),
            ("NETBOX_VERIFY_TLS", "false"),
            ("NETBOX_RESOURCES_DIR", "/tmp/res"),
            ("NETBOX_MCP_LOG_FILE", ""),
        ]));

        assert_eq!(config.netbox.url.as_deref(), Some("https://netbox.example.com"));
        assert_eq!(
            config.netbox.token.as_ref().map(|t| t.expose_secret()),
            Some("abc123")
        );
        assert_eq!(config.netbox.timeout_ms, 1500);
        assert!(!config.netbox.verify_tls);
        assert_eq!(config.resources.dir, PathBuf::from("/tmp/res"));
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let config = NetboxMcpConfig::new().with_overrides(lookup(&[
            ("NETBOX_TIMEOUT_MS", "soon"),
            ("NETBOX_VERIFY_TLS", "maybe"),
            ("NETBOX_URL", "   "),
        ]));
        assert_eq!(config.netbox.timeout_ms, 30_000);
        assert!(config.netbox.verify_tls);
        assert!(config.netbox.url.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[netbox]
url = "https://nb.local"
max_concurrent_requests = 0

[trace]
max_depth_cap = 32

[resources]
update_interval_hours = 6

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = NetboxMcpConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.netbox.url.as_deref(), Some("https://nb.local"));
        assert_eq!(config.netbox.max_concurrent_requests, 1);
        assert_eq!(config.trace.max_depth_cap, 32);
        assert_eq!(config.resources.update_interval_hours, 6);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_load_from_file_errors() {
        let err = NetboxMcpConfig::load_from_file(Path::new("/nonexistent/config.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("read_config_file"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[netbox\nurl = ").unwrap();
        let err = NetboxMcpConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse_config_file"));
    }
}
