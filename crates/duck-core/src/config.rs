//! Configuration types for the duck-typing runtime
//!
//! Everything here is optional: a runtime created with
//! [`DuckConfig::default`] behaves as documented on each field.

use serde::{Deserialize, Serialize};

/// Main runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckConfig {
    /// Graph builder settings
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Matching mode used by `DuckRuntime::duck_as`
    ///
    /// `false` resolves member names exactly; `true` ignores case.
    #[serde(default)]
    pub default_fuzzy: bool,
}

impl DuckConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            builder: BuilderConfig::default(),
            default_fuzzy: false,
        }
    }

    /// Use case-insensitive matching for `duck_as`
    pub fn with_default_fuzzy(mut self, fuzzy: bool) -> Self {
        self.default_fuzzy = fuzzy;
        self
    }

    /// Replace the builder settings
    pub fn with_builder(mut self, builder: BuilderConfig) -> Self {
        self.builder = builder;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.builder.validate()
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DuckConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Graph builder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Deepest nesting the builder populates
    ///
    /// Members below this depth are left at their default value.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Construct concrete members that have a parameterless constructor
    #[serde(default = "default_populate_concrete")]
    pub populate_concrete: bool,

    /// Assign an empty array to array members
    #[serde(default = "default_populate_arrays")]
    pub populate_arrays: bool,
}

impl BuilderConfig {
    /// Validate the builder settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_depth == 0 {
            return Err(crate::Error::config("Builder max_depth must be > 0"));
        }
        Ok(())
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            populate_concrete: default_populate_concrete(),
            populate_arrays: default_populate_arrays(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_populate_concrete() -> bool {
    true
}

fn default_populate_arrays() -> bool {
    true
}
