// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use figment::providers::{Format, Yaml};

use crate::config::{merge_provider, Config, ConfigError, ConfigSource};

/// Reads settings from a YAML file, which must exist.
#[derive(Debug, PartialEq, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct YamlConfigSource {
    pub path: PathBuf,
}

impl ConfigSource for YamlConfigSource {
    fn load(&self, config: &mut Config) -> Result<(), ConfigError> {
        if !self.path.is_file() {
            return Err(ConfigError::Parse {
                origin: self.path.display().to_string(),
                message: "configuration file not found".to_string(),
            });
        }
        merge_provider(
            config,
            Yaml::file(self.path.clone()),
            &self.path.display().to_string(),
        )
    }
}
