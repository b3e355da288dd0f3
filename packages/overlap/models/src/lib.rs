#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row, option and result types for area-weighted overlap aggregation.
//!
//! An [`OverlapRow`] pairs one fine-grained source region (a census tract)
//! with the coarse target area it intersects, plus the source's measured
//! values per subgroup. Aggregation folds rows into an [`Aggregation`] of
//! per-target [`AreaTotals`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A subgroup measurement as delivered by the query layer.
///
/// Query results are sparse and loosely typed: a value may be a number,
/// a string that may or may not hold a number, or absent altogether.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureValue {
    /// A numeric value.
    Number(f64),
    /// A textual value, numeric if it parses as one.
    Text(String),
    /// No value.
    Missing,
    /// Any other JSON value (boolean, array, object). Never numeric.
    Other(serde_json::Value),
}

impl MeasureValue {
    /// The value as a finite number, or `None` if missing, non-numeric or
    /// non-finite.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Missing | Self::Other(_) => None,
        }
        .filter(|n| n.is_finite())
    }
}

impl From<f64> for MeasureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MeasureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MeasureValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for MeasureValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// One source region intersecting one target area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapRow {
    /// Identifier of the target area (e.g. the ward's display name).
    pub target_key: String,
    /// Identifier of the source region, used in contribution breakdowns
    /// and error messages.
    #[serde(default)]
    pub source_key: Option<String>,
    /// Source region geometry as WKT.
    pub source_wkt: String,
    /// Target area geometry as WKT.
    pub target_wkt: String,
    /// Measured values of the source region, keyed by subgroup name.
    #[serde(default)]
    pub values: BTreeMap<String, MeasureValue>,
}

impl OverlapRow {
    /// Creates a row with no source key and no values.
    #[must_use]
    pub fn new(
        target_key: impl Into<String>,
        source_wkt: impl Into<String>,
        target_wkt: impl Into<String>,
    ) -> Self {
        Self {
            target_key: target_key.into(),
            source_key: None,
            source_wkt: source_wkt.into(),
            target_wkt: target_wkt.into(),
            values: BTreeMap::new(),
        }
    }

    /// Sets the source region identifier.
    #[must_use]
    pub fn with_source_key(mut self, source_key: impl Into<String>) -> Self {
        self.source_key = Some(source_key.into());
        self
    }

    /// Adds a subgroup value.
    #[must_use]
    pub fn with_value(mut self, subgroup: impl Into<String>, value: impl Into<MeasureValue>) -> Self {
        self.values.insert(subgroup.into(), value.into());
        self
    }
}

/// What aggregation does with a row whose geometry cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryErrorPolicy {
    /// Stop and report the first failing row.
    #[default]
    Abort,
    /// Leave the row out and record it in [`Aggregation::skipped`].
    Skip,
}

/// Options for one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    /// Subgroups to report. When `None`, every subgroup that appears in
    /// any row is reported.
    #[serde(default)]
    pub subgroups: Option<Vec<String>>,
    /// Handling of unparseable or degenerate geometries.
    #[serde(default)]
    pub on_geometry_error: GeometryErrorPolicy,
}

impl AggregateOptions {
    /// Restricts the reported subgroups.
    #[must_use]
    pub fn with_subgroups<I, S>(mut self, subgroups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subgroups = Some(subgroups.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the geometry error policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: GeometryErrorPolicy) -> Self {
        self.on_geometry_error = policy;
        self
    }
}

/// One source region's share of a target area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    /// Source region identifier, if the row carried one.
    pub source_key: Option<String>,
    /// Fraction of the source region's area inside the target, in `[0, 1]`.
    pub fraction: f64,
}

impl Contribution {
    /// The fraction as a percentage rounded to one decimal place.
    #[must_use]
    pub fn percent(&self) -> f64 {
        (self.fraction * 1000.0).round_ties_even() / 10.0
    }
}

/// Finalized totals for one target area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTotals {
    /// Rounded total per subgroup.
    pub totals: BTreeMap<String, i64>,
    /// Rows folded into this area, in input order.
    pub contributions: Vec<Contribution>,
}

impl AreaTotals {
    /// Rounded total for one subgroup.
    #[must_use]
    pub fn total(&self, subgroup: &str) -> Option<i64> {
        self.totals.get(subgroup).copied()
    }
}

/// A row left out under [`GeometryErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// Zero-based index of the row in the input.
    pub row: usize,
    /// Target area the row belonged to.
    pub target_key: String,
    /// Source region identifier, if any.
    pub source_key: Option<String>,
    /// Why the row was left out.
    pub reason: String,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Totals per target key.
    pub areas: BTreeMap<String, AreaTotals>,
    /// Rows left out because of unusable geometry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
}

impl Aggregation {
    /// Totals for one target area.
    #[must_use]
    pub fn area(&self, target_key: &str) -> Option<&AreaTotals> {
        self.areas.get(target_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_is_a_number() {
        assert_eq!(MeasureValue::from(" 42.5 ").as_number(), Some(42.5));
        assert_eq!(MeasureValue::from(7.0).as_number(), Some(7.0));
    }

    #[test]
    fn non_numeric_values_have_no_number() {
        assert_eq!(MeasureValue::from("n/a").as_number(), None);
        assert_eq!(MeasureValue::from("").as_number(), None);
        assert_eq!(MeasureValue::Missing.as_number(), None);
        assert_eq!(MeasureValue::from(f64::NAN).as_number(), None);
        assert_eq!(MeasureValue::from("inf").as_number(), None);
        assert_eq!(MeasureValue::from(None::<f64>), MeasureValue::Missing);
    }

    #[test]
    fn deserializes_loosely_typed_values() {
        let row: OverlapRow = serde_json::from_str(
            r#"{
                "targetKey": "Ward 1",
                "sourceWkt": "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))",
                "targetWkt": "POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))",
                "values": { "sumvalue": 10, "sumvaluemale": "4", "sumvaluefemale": null }
            }"#,
        )
        .unwrap();

        assert_eq!(row.source_key, None);
        assert_eq!(row.values["sumvalue"], MeasureValue::Number(10.0));
        assert_eq!(row.values["sumvaluemale"].as_number(), Some(4.0));
        assert_eq!(row.values["sumvaluefemale"], MeasureValue::Missing);
    }

    #[test]
    fn deserializes_unexpected_value_types_as_non_numeric() {
        let row: OverlapRow = serde_json::from_str(
            r#"{
                "targetKey": "Ward 1",
                "sourceWkt": "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))",
                "targetWkt": "POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))",
                "values": { "sumvalue": true, "sumvaluemale": { "n": 4 }, "sumvaluefemale": [1] }
            }"#,
        )
        .unwrap();

        assert_eq!(
            row.values["sumvalue"],
            MeasureValue::Other(serde_json::Value::Bool(true))
        );
        assert!(row.values.values().all(|value| value.as_number().is_none()));
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        let contribution = Contribution {
            source_key: Some("Tract 1".to_string()),
            fraction: 0.123_44,
        };
        assert!((contribution.percent() - 12.3).abs() < 1e-9);

        let whole = Contribution {
            source_key: None,
            fraction: 1.0,
        };
        assert!((whole.percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn options_default_to_abort() {
        let options: AggregateOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.on_geometry_error, GeometryErrorPolicy::Abort);
        assert_eq!(options.subgroups, None);

        let options: AggregateOptions =
            serde_json::from_str(r#"{ "onGeometryError": "skip" }"#).unwrap();
        assert_eq!(options.on_geometry_error, GeometryErrorPolicy::Skip);
    }
}
