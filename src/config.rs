// SPDX-License-Identifier: MPL-2.0

//! Declarative description of the selection chain.
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. built-in defaults (the category → subcategory → sub-subcategory chain)
//! 2. an optional TOML file
//! 3. environment variables (`CASCADIA__BASE_URL` -> `base_url`,
//!    `CASCADIA__OBSERVABILITY__LOG_LEVEL` -> `observability.log_level`)

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::widgets::cascade::Level;

/// Marker substituted with the parent identifier in endpoint templates.
pub const PARENT_MARKER: &str = "{parent}";

/// Placeholder label rendered by the admin forms for "no selection".
pub const DEFAULT_PLACEHOLDER_LABEL: &str = "---------";

/// One dependent level of the chain.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LevelConfig {
    /// Position in the chain; level 0 is the root and is never configured.
    pub level: Level,
    /// Human-readable name, used in logs.
    pub name: String,
    /// Endpoint path template relative to `base_url`, containing `{parent}`.
    pub endpoint: String,
    /// Field holding the children array when the endpoint wraps it in an object.
    #[serde(default)]
    pub wrapper_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CascadeConfig {
    /// Server URL the endpoint templates are resolved against (e.g., http://localhost:8000)
    pub base_url: String,
    /// Endpoint listing the root categories, used when the root options are
    /// not supplied by the page
    pub roots_endpoint: Option<String>,
    /// Label of the empty first entry of every dependent control
    pub placeholder_label: String,
    pub request_timeout_secs: u64,
    pub observability: ObservabilityConfig,
    pub levels: Vec<LevelConfig>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000"),
            roots_endpoint: Some(String::from("/store/categories/")),
            placeholder_label: String::from(DEFAULT_PLACEHOLDER_LABEL),
            request_timeout_secs: 10,
            observability: ObservabilityConfig::default(),
            levels: vec![
                LevelConfig {
                    level: 1,
                    name: String::from("subcategory"),
                    endpoint: String::from("/store/ajax/load-subcategories/?category_id={parent}"),
                    wrapper_key: Some(String::from("subcategories")),
                },
                LevelConfig {
                    level: 2,
                    name: String::from("sub_subcategory"),
                    endpoint: String::from(
                        "/store/ajax/load-sub-subcategories/?subcategory_id={parent}",
                    ),
                    wrapper_key: Some(String::from("sub_subcategories")),
                },
            ],
        }
    }
}

impl CascadeConfig {
    /// Load defaults, then `path` (if given and present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("CASCADIA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the level list forms the chain 1..=N and every template is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }

        for (i, level) in self.levels.iter().enumerate() {
            let expected = i + 1;
            if level.level != expected {
                return Err(ConfigError::LevelOrder {
                    expected,
                    found: level.level,
                });
            }
            if !level.endpoint.contains(PARENT_MARKER) {
                return Err(ConfigError::MissingParentMarker {
                    level: level.level,
                    endpoint: level.endpoint.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of controls in the chain, root included.
    pub fn depth(&self) -> usize {
        self.levels.len() + 1
    }

    pub fn level(&self, level: Level) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// Name of `level` for logging; the root is always "category".
    pub fn level_name(&self, level: Level) -> &str {
        match level {
            0 => "category",
            n => self.level(n).map(|l| l.name.as_str()).unwrap_or("unknown"),
        }
    }
}
