// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading.
//!
//! Sources are applied in order, later ones overriding earlier ones:
//!
//! 1. **Defaults** - see [`Config::default`]
//! 2. **YAML file** - passed with `--config` or `LOG_SHIPPER_CONFIG`
//! 3. **Environment variables** - `LOG_SHIPPER_*`, nested keys joined with `__`
//!    (e.g. `LOG_SHIPPER_SINK__STREAM_NAME`)
//!
//! The result is validated once every source has been applied.
//!
//! ```yaml
//! log_level: debug
//! max_chunk_bytes: 1048576
//! lookback_secs: 4320
//! interval_secs: 900
//! source:
//!   kind: http
//!   url: https://api.example.com/v2/audit/logs
//!   token: ...
//! sink:
//!   endpoint: https://dce.ingest.monitor.example.com
//!   rule_id: dcr-0000
//!   stream_name: Custom-AuditLogs
//!   token: ...
//! ```

pub mod env;
pub mod log_level;
pub mod yaml;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::Serialized;
use figment::{Figment, Provider};
use serde::{Deserialize, Serialize};

use crate::config::env::EnvConfigSource;
use crate::config::log_level::LogLevel;
use crate::config::yaml::YamlConfigSource;

/// Payload ceiling of a single ingestion call.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1_024 * 1_024;

/// 1.2 hours.
pub const DEFAULT_LOOKBACK_SECS: u64 = 4_320;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 10_000;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SINK_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INGESTION_API_VERSION: &str = "2023-01-01";

#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ConfigError {
    #[error("failed to parse configuration from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Paginated JSON API.
    #[default]
    Http,
    /// Newline-delimited JSON file.
    File,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: String,
    pub token: Secret,
    pub page_size: u32,
    pub max_pages: u32,
    pub timeout_secs: u64,
    /// Response field holding the page of records.
    pub data_field: String,
    /// Response field holding the next page cursor.
    pub cursor_field: String,
    pub start_param: String,
    pub end_param: String,
    pub limit_param: String,
    pub cursor_param: String,
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kind: SourceKind::Http,
            url: String::new(),
            token: Secret::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            data_field: "data".to_string(),
            cursor_field: "cursor".to_string(),
            start_param: "createdAfter".to_string(),
            end_param: "createdBefore".to_string(),
            limit_param: "limit".to_string(),
            cursor_param: "cursor".to_string(),
            path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Data collection endpoint, e.g. `https://my-dce.westeurope-1.ingest.monitor.azure.com`.
    pub endpoint: String,
    pub rule_id: String,
    pub stream_name: String,
    pub token: Secret,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            endpoint: String::new(),
            rule_id: String::new(),
            stream_name: String::new(),
            token: Secret::default(),
            api_version: DEFAULT_INGESTION_API_VERSION.to_string(),
            timeout_secs: DEFAULT_SINK_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub max_chunk_bytes: usize,
    pub lookback_secs: u64,
    /// Seconds between runs. `None` runs once and exits.
    pub interval_secs: Option<u64>,
    pub source: SourceConfig,
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            lookback_secs: DEFAULT_LOOKBACK_SECS,
            interval_secs: None,
            source: SourceConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }

    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }

    /// Checks that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_chunk_bytes must be greater than 0".to_string(),
            ));
        }
        if self.lookback_secs == 0 {
            return Err(ConfigError::Invalid(
                "lookback_secs must be greater than 0".to_string(),
            ));
        }
        if self.interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "interval_secs must be greater than 0 when set".to_string(),
            ));
        }

        match self.source.kind {
            SourceKind::Http => {
                require("source.url", &self.source.url)?;
                if self.source.token.is_empty() {
                    return Err(missing("source.token"));
                }
                if self.source.page_size == 0 {
                    return Err(ConfigError::Invalid(
                        "source.page_size must be greater than 0".to_string(),
                    ));
                }
            }
            SourceKind::File => {
                if self.source.path.is_none() {
                    return Err(missing("source.path"));
                }
            }
        }

        require("sink.endpoint", &self.sink.endpoint)?;
        require("sink.rule_id", &self.sink.rule_id)?;
        require("sink.stream_name", &self.sink.stream_name)?;
        if self.sink.token.is_empty() {
            return Err(missing("sink.token"));
        }

        Ok(())
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::Invalid(format!("{field} is required"))
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(missing(field));
    }
    Ok(())
}

#[allow(clippy::module_name_repetitions)]
pub trait ConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError>;
}

/// Layers `provider` on top of `config`.
pub(crate) fn merge_provider<P: Provider>(
    config: &mut Config,
    provider: P,
    origin: &str,
) -> Result<(), ConfigError> {
    let merged = Figment::from(Serialized::defaults(&*config))
        .merge(provider)
        .extract::<Config>()
        .map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
    *config = merged;
    Ok(())
}

#[derive(Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    config: Config,
}

#[allow(clippy::module_name_repetitions)]
impl ConfigBuilder {
    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Applies every source in order and validates the result.
    ///
    /// # Errors
    ///
    /// Fails on the first source that cannot be parsed, or when the merged
    /// configuration is invalid.
    pub fn build(mut self) -> Result<Config, ConfigError> {
        for source in &self.sources {
            source.load(&mut self.config)?;
        }

        self.config.source.url = self.config.source.url.trim().to_string();
        self.config.sink.endpoint = self
            .config
            .sink
            .endpoint
            .trim()
            .trim_end_matches('/')
            .to_string();

        self.config.validate()?;
        Ok(self.config)
    }
}

/// Loads the configuration from defaults, the optional YAML file and the
/// environment.
///
/// # Errors
///
/// See [`ConfigBuilder::build`].
pub fn get_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = ConfigBuilder::default();
    if let Some(path) = path {
        builder = builder.add_source(Box::new(YamlConfigSource {
            path: path.to_path_buf(),
        }));
    }
    builder.add_source(Box::new(EnvConfigSource)).build()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                url: "https://api.example.com/v2/audit/logs".to_string(),
                token: Secret::new("source-token"),
                ..SourceConfig::default()
            },
            sink: SinkConfig {
                endpoint: "https://dce.example.com".to_string(),
                rule_id: "dcr-123".to_string(),
                stream_name: "Custom-AuditLogs".to_string(),
                token: Secret::new("sink-token"),
                ..SinkConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_chunk_bytes, 1_048_576);
        assert_eq!(config.lookback(), Duration::from_secs(4_320));
        assert_eq!(config.interval(), None);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.source.page_size, 100);
        assert_eq!(config.sink.api_version, "2023-01-01");
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_bytes_is_invalid() {
        let config = Config {
            max_chunk_bytes: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_chunk_bytes must be greater than 0"
        );
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = Config {
            interval_secs: Some(0),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_source_requires_url_and_token() {
        let mut config = valid_config();
        config.source.url = "  ".to_string();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "invalid configuration: source.url is required"
        );

        let mut config = valid_config();
        config.source.token = Secret::default();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "invalid configuration: source.token is required"
        );
    }

    #[test]
    fn test_file_source_requires_path_only() {
        let mut config = valid_config();
        config.source.kind = SourceKind::File;
        config.source.url = String::new();
        config.source.token = Secret::default();
        assert!(config.validate().is_err());

        config.source.path = Some(PathBuf::from("/var/log/audit.ndjson"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sink_fields_are_required() {
        for field in ["endpoint", "rule_id", "stream_name"] {
            let mut config = valid_config();
            match field {
                "endpoint" => config.sink.endpoint.clear(),
                "rule_id" => config.sink.rule_id.clear(),
                _ => config.sink.stream_name.clear(),
            }
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = valid_config();
        let debug = format!("{config:?}");
        assert!(!debug.contains("source-token"));
        assert!(!debug.contains("sink-token"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_get_config_from_yaml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yaml",
                r"
log_level: debug
max_chunk_bytes: 1000000
interval_secs: 900
source:
  url: https://api.example.com/v2/audit/logs
  token: yaml-source-token
  page_size: 50
sink:
  endpoint: https://dce.example.com/
  rule_id: dcr-yaml
  stream_name: Custom-Yaml
  token: yaml-sink-token
",
            )?;
            jail.set_env("LOG_SHIPPER_SINK__STREAM_NAME", "Custom-Env");

            let config = get_config(Some(Path::new("shipper.yaml"))).unwrap();

            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(config.max_chunk_bytes, 1_000_000);
            assert_eq!(config.interval(), Some(Duration::from_secs(900)));
            assert_eq!(config.source.page_size, 50);
            assert_eq!(config.source.data_field, "data");
            assert_eq!(config.source.token.expose(), "yaml-source-token");
            assert_eq!(config.sink.endpoint, "https://dce.example.com");
            assert_eq!(config.sink.rule_id, "dcr-yaml");
            assert_eq!(config.sink.stream_name, "Custom-Env");
            Ok(())
        });
    }

    #[test]
    fn test_get_config_missing_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let err = get_config(Some(Path::new("absent.yaml"))).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_get_config_missing_required_fields() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let err = get_config(None).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
            Ok(())
        });
    }
}
