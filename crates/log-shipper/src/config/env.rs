// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use figment::providers::Env;

use crate::config::{merge_provider, Config, ConfigError, ConfigSource};

pub const ENV_PREFIX: &str = "LOG_SHIPPER_";

/// Reads `LOG_SHIPPER_*` variables. `__` separates nested keys, so
/// `LOG_SHIPPER_SOURCE__PAGE_SIZE` sets `source.page_size`.
#[derive(Debug, Default, Clone, Copy)]
#[allow(clippy::module_name_repetitions)]
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError> {
        let provider = Env::prefixed(ENV_PREFIX)
            .split("__")
            .ignore(&["config"]);
        merge_provider(config, provider, "environment")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::log_level::LogLevel;

    #[test]
    fn test_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LOG_SHIPPER_LOG_LEVEL", "TRACE");
            jail.set_env("LOG_SHIPPER_MAX_CHUNK_BYTES", "500000");
            jail.set_env("LOG_SHIPPER_SOURCE__PAGE_SIZE", "25");
            jail.set_env("LOG_SHIPPER_SINK__RULE_ID", "dcr-env");
            jail.set_env("LOG_SHIPPER_CONFIG", "/etc/log-shipper.yaml");

            let mut config = Config::default();
            EnvConfigSource.load(&mut config).unwrap();

            assert_eq!(config.log_level, LogLevel::Trace);
            assert_eq!(config.max_chunk_bytes, 500_000);
            assert_eq!(config.source.page_size, 25);
            assert_eq!(config.sink.rule_id, "dcr-env");
            Ok(())
        });
    }

    #[test]
    fn test_unrelated_env_is_ignored() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("MAX_CHUNK_BYTES", "1");
            let mut config = Config::default();
            EnvConfigSource.load(&mut config).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_bad_value_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("LOG_SHIPPER_MAX_CHUNK_BYTES", "lots");
            let mut config = Config::default();
            let err = EnvConfigSource.load(&mut config).unwrap_err();
            assert!(err.to_string().contains("environment"));
            Ok(())
        });
    }
}
