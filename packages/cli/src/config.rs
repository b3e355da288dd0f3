//! Aggregation configuration, deserialized from TOML.
//!
//! The built-in configuration matches the column names of the tract/area
//! overlap query; a file passed with `--config` replaces it entirely.

use std::path::Path;

use census_overlay_overlap::{AggregateOptions, GeometryErrorPolicy};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// How to turn input rows into an aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Value columns to aggregate. When absent, every column that is not a
    /// key or geometry column is treated as a subgroup.
    #[serde(default)]
    pub subgroups: Option<Vec<String>>,
    /// What to do with rows whose geometry cannot be used.
    #[serde(default)]
    pub on_geometry_error: GeometryErrorPolicy,
    /// Input column names.
    pub columns: ColumnMapping,
}

/// Names of the key and geometry columns in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column holding the target area's name.
    pub target_key: String,
    /// Column holding the source region's name, if any.
    #[serde(default)]
    pub source_key: Option<String>,
    /// Column holding the source region's WKT.
    pub source_wkt: String,
    /// Column holding the target area's WKT.
    pub target_wkt: String,
}

impl ColumnMapping {
    /// Every column name the mapping refers to.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.target_key.as_str()),
            self.source_key.as_deref(),
            Some(self.source_wkt.as_str()),
            Some(self.target_wkt.as_str()),
        ]
        .into_iter()
        .flatten()
    }
}

impl AggregationConfig {
    /// Returns the built-in configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. It is a compile-time
    /// constant, so a failure is a development error caught by the tests.
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded aggregation config: {e}"))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::de::from_str(&text)?;
        log::debug!("Loaded aggregation config from {}", path.display());
        Ok(config)
    }

    /// Aggregation options for this configuration.
    #[must_use]
    pub fn options(&self) -> AggregateOptions {
        AggregateOptions {
            subgroups: self.subgroups.clone(),
            on_geometry_error: self.on_geometry_error,
        }
    }
}
