//! Compilation configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolver::DEFAULT_MAX_PASSES;

/// Per-compilation settings
///
/// Missing fields take their defaults when loading from TOML or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Bound on fixed-point re-expansion passes
    pub max_passes: usize,
    /// Walk versions on the rayon pool
    pub parallel: bool,
}

impl CompileConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With pass limit
    #[inline]
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// With parallel per-version walks
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse from TOML and validate
    ///
    /// # Errors
    /// Returns error if TOML is invalid or a value is out of range
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON and validate
    ///
    /// # Errors
    /// Returns error if JSON is invalid or a value is out of range
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values are usable
    ///
    /// # Errors
    /// `max_passes` of zero would reject every invocation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_passes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_passes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            parallel: false,
        }
    }
}
