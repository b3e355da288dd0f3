#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area-weighted reaggregation of source measurements onto target areas.
//!
//! Census measurements are published for fine-grained source regions
//! (tracts) that do not line up with the administrative areas (wards,
//! neighbourhoods) people ask about. Each source region is apportioned to a
//! target area by the fraction of its area that lies inside the target:
//! [`overlap_fraction`] computes that weight and [`aggregate`] folds weighted
//! values into one rounded total per target and subgroup.
//!
//! Rows whose values are missing or non-numeric contribute zero. Rows whose
//! geometry is malformed or degenerate are never zero-filled: they fail the
//! aggregation, or are recorded as skipped when the caller opts into
//! [`GeometryErrorPolicy::Skip`].

pub mod aggregate;
pub mod features;
pub mod fraction;

pub use aggregate::aggregate;
pub use census_overlay_geometry::{GeometryParseError, Polygon, parse};
pub use census_overlay_overlap_models::{
    AggregateOptions, Aggregation, AreaTotals, Contribution, GeometryErrorPolicy, MeasureValue,
    OverlapRow, SkippedRow,
};
pub use features::{display_geometries, feature_collection};
pub use fraction::overlap_fraction;

use std::fmt;

use thiserror::Error;

/// Errors from a single overlap computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OverlapError {
    /// The source polygon has zero area, so no fraction of it exists.
    #[error("Source polygon is degenerate (zero area)")]
    DegeneratePolygon,
}

/// Which geometry of a row failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRole {
    /// The fine-grained source region.
    Source,
    /// The coarse target area.
    Target,
}

impl fmt::Display for GeometryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Target => "target",
        })
    }
}

/// Errors that stop an aggregation pass, attributed to the offending row.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A row's source or target WKT could not be parsed.
    #[error(
        "Row {row} (target '{target_key}', source {}): invalid {role} geometry: {source}",
        source_label(.source_key.as_deref())
    )]
    Geometry {
        /// Zero-based index of the row in the input.
        row: usize,
        /// Target area of the row.
        target_key: String,
        /// Source region identifier, if any.
        source_key: Option<String>,
        /// Which of the two geometries failed.
        role: GeometryRole,
        /// Parser error.
        #[source]
        source: GeometryParseError,
    },

    /// A row's source polygon has zero area.
    #[error(
        "Row {row} (target '{target_key}', source {}): {source}",
        source_label(.source_key.as_deref())
    )]
    Degenerate {
        /// Zero-based index of the row in the input.
        row: usize,
        /// Target area of the row.
        target_key: String,
        /// Source region identifier, if any.
        source_key: Option<String>,
        /// Overlap error.
        #[source]
        source: OverlapError,
    },

    /// A rounded total does not fit in an `i64`.
    #[error("Total of '{subgroup}' for target '{target_key}' is out of range: {sum}")]
    TotalOutOfRange {
        /// Target area whose total overflowed.
        target_key: String,
        /// Subgroup whose total overflowed.
        subgroup: String,
        /// Unrounded weighted sum.
        sum: f64,
    },
}

impl AggregateError {
    /// Zero-based index of the failing row, if the error belongs to one.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::Geometry { row, .. } | Self::Degenerate { row, .. } => Some(*row),
            Self::TotalOutOfRange { .. } => None,
        }
    }

    /// Target area of the failing row.
    #[must_use]
    pub fn target_key(&self) -> &str {
        match self {
            Self::Geometry { target_key, .. }
            | Self::Degenerate { target_key, .. }
            | Self::TotalOutOfRange { target_key, .. } => target_key,
        }
    }
}

fn source_label(source_key: Option<&str>) -> String {
    source_key.map_or_else(|| "<unnamed>".to_string(), |key| format!("'{key}'"))
}
