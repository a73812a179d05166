//! Configuration loading and constants.
//!
//! Defines the defaults for the listener, the fault injection knobs and the
//! logging setup, and loads overrides from an optional TOML file.
//! `AppConfig` is the root configuration struct containing all settings.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use const_format::formatcp;
use serde::Deserialize;

// =============================================================================
// HTTP Listener
// =============================================================================

/// Listen on all interfaces by default
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// How long in-flight requests may keep running after a shutdown signal.
/// Must outlast the injected delay so stalled requests still get their answer.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

/// Status responses must never be served from an intermediary cache
pub const CACHE_CONTROL_STATUS: &str = "no-store";

// =============================================================================
// Fault Injection
// =============================================================================

/// Probability that a status request is stalled
pub const DEFAULT_DELAY_PROBABILITY: f64 = 0.5;

/// Length of the stall in seconds
pub const DEFAULT_DELAY_SECS: u64 = 10;

// =============================================================================
// Logging
// =============================================================================

/// Name of the crate as it appears in log targets
pub const LOG_TARGET: &str = "flaky_status";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info,tower_http=info", LOG_TARGET);

/// Environment variable overriding the listen host
pub const HOST_ENV: &str = "STATUS_HOST";

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "STATUS_PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Fault injection settings for `/status`
    #[serde(default)]
    pub fault: FaultConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    /// Grace period for draining connections on shutdown
    #[serde(default = "HttpServerConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            shutdown_grace_seconds: Self::default_shutdown_grace(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    fn default_shutdown_grace() -> u64 {
        DEFAULT_SHUTDOWN_GRACE_SECS
    }

    /// Resolve host and port into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::Validation(format!("http.host is not an IP address: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

/// Fault injection settings
#[derive(Debug, Clone, Deserialize)]
pub struct FaultConfig {
    /// Chance in [0, 1] that a request is stalled (default: 0.5)
    #[serde(default = "FaultConfig::default_probability")]
    pub probability: f64,
    /// Stall length in seconds (default: 10)
    #[serde(default = "FaultConfig::default_delay_seconds")]
    pub delay_seconds: u64,
    /// Seed for reproducible draws. Unset means a fresh thread-local generator.
    pub seed: Option<u64>,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            probability: Self::default_probability(),
            delay_seconds: Self::default_delay_seconds(),
            seed: None,
        }
    }
}

impl FaultConfig {
    fn default_probability() -> f64 {
        DEFAULT_DELAY_PROBABILITY
    }

    fn default_delay_seconds() -> u64 {
        DEFAULT_DELAY_SECS
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.fault.probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Validation(format!(
                "fault.probability must be between 0 and 1, got {}",
                p
            )));
        }
        if self.http.shutdown_grace_seconds <= self.fault.delay_seconds {
            return Err(ConfigError::Validation(format!(
                "http.shutdown_grace_seconds ({}) must exceed fault.delay_seconds ({})",
                self.http.shutdown_grace_seconds, self.fault.delay_seconds
            )));
        }
        self.http.socket_addr()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.fault.probability, 0.5);
        assert_eq!(config.fault.delay(), Duration::from_secs(10));
        assert!(config.fault.seed.is_none());
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_log_filter() {
        assert_eq!(DEFAULT_LOG_FILTER, "flaky_status=info,tower_http=info");
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
[http]
host = "127.0.0.1"
port = 8080
shutdown_grace_seconds = 15

[fault]
probability = 0.25
delay_seconds = 3
seed = 7

[logging]
format = "json"
"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(
            config.http.socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
        assert_eq!(config.http.shutdown_grace(), Duration::from_secs(15));
        assert_eq!(config.fault.probability, 0.25);
        assert_eq!(config.fault.delay_seconds, 3);
        assert_eq!(config.fault.seed, Some(7));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config("[fault]\ndelay_seconds = 1\n");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.fault.delay_seconds, 1);
        assert_eq!(config.fault.probability, DEFAULT_DELAY_PROBABILITY);
        assert_eq!(config.http.port, DEFAULT_PORT);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = write_config("");
        assert!(AppConfig::load(file.path()).is_ok());
    }

    #[test]
    fn test_probability_out_of_range() {
        let file = write_config("[fault]\nprobability = 1.5\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_grace_must_outlast_stall() {
        let file = write_config("[http]\nshutdown_grace_seconds = 10\n\n[fault]\ndelay_seconds = 10\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("shutdown_grace_seconds")));

        let file = write_config("[http]\nshutdown_grace_seconds = 11\n\n[fault]\ndelay_seconds = 10\n");
        assert!(AppConfig::load(file.path()).is_ok());
    }

    #[test]
    fn test_invalid_host() {
        let file = write_config("[http]\nhost = \"not-an-ip\"\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unknown_log_format() {
        let file = write_config("[logging]\nformat = \"xml\"\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = AppConfig::load(path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.http.port, defaults.http.port);
        assert_eq!(config.fault.probability, defaults.fault.probability);
        assert_eq!(config.fault.delay_seconds, defaults.fault.delay_seconds);
        assert!(config.http.shutdown_grace_seconds > config.fault.delay_seconds);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("/nonexistent/flaky-status.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
