#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch front end for census overlap aggregation.
//!
//! Reads the tabular result of a tract/area overlap query from CSV, maps
//! its columns onto [`OverlapRow`](census_overlay_overlap::OverlapRow)s
//! according to an [`AggregationConfig`], and hands them to
//! [`census_overlay_overlap::aggregate`].

pub mod config;
pub mod rows;

pub use config::{AggregationConfig, ColumnMapping};
pub use rows::read_rows;

use thiserror::Error;

/// Errors that can occur while loading configuration or input rows.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`AggregationConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The input is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configured column is not in the CSV header.
    #[error("Column '{column}' not found in input header")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
}
