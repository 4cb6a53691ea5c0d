//! # Storage Configuration
//!
//! Sizing knobs for the entity manager, loadable from TOML:
//!
//! ```toml
//! entities_per_chunk = 4096
//! max_component_types = 1024
//! component_capacity = 1024
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::DEFAULT_MAX_COMPONENT_TYPES;
use crate::error::{ConfigError, ConfigResult};
use crate::memory::DEFAULT_ELEMENTS_PER_CHUNK;

/// Sizing for an [`EntityManager`](crate::EntityManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Entity table slots added per growth step. Must be a power of two.
    pub entities_per_chunk: usize,
    /// Upper bound on registered component types.
    pub max_component_types: usize,
    /// Slots reserved when a component type's storage is first created.
    pub component_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            entities_per_chunk: DEFAULT_ELEMENTS_PER_CHUNK,
            max_component_types: DEFAULT_MAX_COMPONENT_TYPES,
            component_capacity: 1024,
        }
    }
}

impl StorageConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("loaded storage config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Loads `path`, falling back to defaults on any error.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_path(path).unwrap_or_else(|err| {
            tracing::warn!(
                "failed to load storage config {}: {}. Using defaults.",
                path.display(),
                err
            );
            Self::default()
        })
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.entities_per_chunk.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "entities_per_chunk must be a non-zero power of two, got {}",
                self.entities_per_chunk
            )));
        }
        if self.max_component_types == 0 {
            return Err(ConfigError::Invalid(
                "max_component_types must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
