//! Declarative container configuration
//!
//! Bindings and aliases that map names to names can be kept in a TOML file:
//!
//! ```toml
//! warm_up = ["UserController"]
//! alias_cache = "evict_alias"
//!
//! [bindings]
//! LoggerInterface = "FileLogger"
//!
//! [aliases]
//! logger = "LoggerInterface"
//!
//! [suggestions]
//! max_suggestions = 5
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AliasCachePolicy, DIError, DIResult, SuggestionConfig};

/// Settings applied by [`ContainerBuilder::with_config`](crate::ContainerBuilder::with_config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Abstract type name to concrete type name
    pub bindings: BTreeMap<String, String>,
    pub aliases: BTreeMap<String, String>,
    /// Types whose argument lists are resolved right after build
    pub warm_up: Vec<String>,
    pub alias_cache: AliasCachePolicy,
    pub suggestions: SuggestionConfig,
}

impl ContainerConfig {
    pub fn from_toml_str(source: &str) -> DIResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| DIError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> DIResult<Self> {
        let path = path.as_ref();
        debug!("Loading container config from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> DIResult<()> {
        let threshold = self.suggestions.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DIError::Config {
                message: format!("similarity_threshold must be between 0 and 1, got {}", threshold),
            });
        }

        if let Some((alias, _)) = self.aliases.iter().find(|(alias, target)| alias == target) {
            return Err(DIError::Config {
                message: format!("alias '{}' points at itself", alias),
            });
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> DIResult<String> {
        toml::to_string(self).map_err(|e| DIError::Config {
            message: e.to_string(),
        })
    }
}
