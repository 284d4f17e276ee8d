//! Configuration for the Prometheus exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use huesight_common::{LoggingConfig, load_config, parse_config};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] huesight_common::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Hue bridge connection settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Sensor processing settings.
    #[serde(default)]
    pub sensors: SensorsConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hue bridge connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bridge host or base URL (e.g. "192.168.1.10").
    #[serde(default, alias = "ip_address")]
    pub address: String,

    /// API key ("username") created by pairing with the bridge.
    #[serde(default)]
    pub api_key: String,

    /// Timeout for each bridge request (default: 5 seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    5
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Sensor processing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorsConfig {
    /// Sensor type tags to exclude entirely (e.g. "CLIPPresence").
    #[serde(default)]
    pub ignore_types: Vec<String>,

    /// Label motion sensor companions with the presence sensor's name.
    #[serde(default)]
    pub match_names: bool,
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9366").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Metric name prefix (default: "hue").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_listen() -> String {
    "0.0.0.0:9366".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_namespace() -> String {
    "hue".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            namespace: default_namespace(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ExporterConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as JSON, which is valid JSON5.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content + "\n")?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bridge.address must be set".to_string(),
            ));
        }

        if self.bridge.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "bridge.timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if matches!(self.prometheus.path.as_str(), "/" | "/health") {
            return Err(ConfigError::Validation(format!(
                "Metrics path {} is reserved",
                self.prometheus.path
            )));
        }

        if !is_valid_namespace(&self.prometheus.namespace) {
            return Err(ConfigError::Validation(format!(
                "Invalid metric namespace: {}",
                self.prometheus.namespace
            )));
        }

        Ok(())
    }
}

/// Namespaces must match `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_namespace(namespace: &str) -> bool {
    let mut chars = namespace.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huesight_common::LogFormat;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{ bridge: { address: "192.168.1.10" } }"#;
        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.bridge.address, "192.168.1.10");
        assert_eq!(config.bridge.timeout(), Duration::from_secs(5));
        assert_eq!(config.prometheus.listen, "0.0.0.0:9366");
        assert_eq!(config.prometheus.path, "/metrics");
        assert_eq!(config.prometheus.namespace, "hue");
        assert!(config.sensors.ignore_types.is_empty());
        assert!(!config.sensors.match_names);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            bridge: {
                ip_address: "10.0.0.2",
                api_key: "abcdef",
                timeout_secs: 3,
            },
            sensors: {
                ignore_types: ["CLIPPresence", "ZLLLightLevel"],
                match_names: true,
            },
            prometheus: {
                listen: "127.0.0.1:9367",
                path: "/hue/metrics",
                namespace: "philips_hue",
            },
            logging: {
                level: "debug",
                format: "json",
            },
        }"#;

        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.bridge.address, "10.0.0.2");
        assert_eq!(config.bridge.api_key, "abcdef");
        assert_eq!(config.bridge.timeout_secs, 3);
        assert_eq!(
            config.sensors.ignore_types,
            vec!["CLIPPresence", "ZLLLightLevel"]
        );
        assert!(config.sensors.match_names);
        assert_eq!(config.prometheus.listen, "127.0.0.1:9367");
        assert_eq!(config.prometheus.path, "/hue/metrics");
        assert_eq!(config.prometheus.namespace, "philips_hue");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_missing_address() {
        let result = ExporterConfig::parse("{}");
        assert!(result.unwrap_err().to_string().contains("bridge.address"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let json = r#"{ bridge: { address: "h", timeout_secs: 0 } }"#;
        assert!(ExporterConfig::parse(json).is_err());
    }

    #[test]
    fn test_validate_invalid_listen() {
        let json = r#"{
            bridge: { address: "h" },
            prometheus: { listen: "not-an-address" }
        }"#;

        let result = ExporterConfig::parse(json);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let json = r#"{
            bridge: { address: "h" },
            prometheus: { path: "no-leading-slash" }
        }"#;

        let result = ExporterConfig::parse(json);
        assert!(result.unwrap_err().to_string().contains("must start with /"));
    }

    #[test]
    fn test_validate_reserved_path() {
        let json = r#"{
            bridge: { address: "h" },
            prometheus: { path: "/health" }
        }"#;

        assert!(ExporterConfig::parse(json)
                .unwrap_err()
                .to_string()
                .contains("reserved"));
    }

    #[test]
    fn test_validate_namespace() {
        assert!(is_valid_namespace("hue"));
        assert!(is_valid_namespace("_hue2"));
        assert!(!is_valid_namespace("2hue"));
        assert!(!is_valid_namespace("hue-lights"));
        assert!(!is_valid_namespace(""));
    }

    #[test]
    fn test_parse_error() {
        let result = ExporterConfig::parse("{ bridge: ");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExporterConfig::load_from_file(dir.path().join("missing.json5"));

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huesight.json5");

        let mut config = ExporterConfig::default();
        config.bridge.address = "192.168.1.10".to_string();
        config.bridge.api_key = "generated-key".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = ExporterConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.bridge.address, "192.168.1.10");
        assert_eq!(loaded.bridge.api_key, "generated-key");
        assert_eq!(loaded.prometheus.listen, "0.0.0.0:9366");
    }
}
