//! Fan-in of weighted source values into per-target totals.
//!
//! Rows are partitioned by target key and each partition is folded on its
//! own, in input order, so no running sum is ever shared. With the
//! `parallel` feature the partitions are folded on the `rayon` pool; the
//! result is bit-identical to the serial fold.

use std::collections::{BTreeMap, BTreeSet};

use census_overlay_geometry::{GeometryParseError, Polygon, parse};
use census_overlay_overlap_models::{
    AggregateOptions, Aggregation, AreaTotals, Contribution, GeometryErrorPolicy, MeasureValue,
    OverlapRow, SkippedRow,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{AggregateError, GeometryRole, overlap_fraction};

/// Aggregates source values onto target areas, weighted by overlap.
///
/// For every row the source polygon's [`overlap_fraction`] inside the target
/// polygon is multiplied into each requested subgroup value and added to
/// that target's running sum. Sums are rounded half-to-even once all rows
/// are folded; each subgroup is rounded on its own, so subgroup totals need
/// not add up to an overall total.
///
/// Rows with missing or non-numeric values contribute zero for those
/// subgroups and still appear in the contribution breakdown.
///
/// Requested subgroups are `options.subgroups`, or every subgroup seen in
/// any row. Every target key in the input gets an entry, even if all of its
/// rows were skipped.
///
/// # Errors
///
/// Under [`GeometryErrorPolicy::Abort`], returns [`AggregateError`] for the
/// lowest-indexed row whose source or target WKT does not parse or whose
/// source polygon has zero area. Under [`GeometryErrorPolicy::Skip`] such
/// rows are listed in [`Aggregation::skipped`] instead.
///
/// Regardless of policy, returns [`AggregateError::TotalOutOfRange`] if a
/// rounded total does not fit in an `i64`. Row errors take precedence.
pub fn aggregate(
    rows: &[OverlapRow],
    options: &AggregateOptions,
) -> Result<Aggregation, AggregateError> {
    let subgroups = options
        .subgroups
        .clone()
        .unwrap_or_else(|| collect_subgroups(rows));
    let policy = options.on_geometry_error;
    let groups = group_rows(rows);

    log::debug!(
        "Aggregating {} rows into {} target areas over subgroups {subgroups:?}",
        rows.len(),
        groups.len()
    );

    #[cfg(feature = "parallel")]
    let folded: Vec<_> = groups
        .par_iter()
        .map(|(key, indices)| (*key, fold_area(rows, key, indices, &subgroups, policy)))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let folded: Vec<_> = groups
        .iter()
        .map(|(key, indices)| (*key, fold_area(rows, key, indices, &subgroups, policy)))
        .collect();

    let mut aggregation = Aggregation::default();
    let mut first_error: Option<AggregateError> = None;

    for (key, result) in folded {
        match result {
            Ok(area) => {
                aggregation.areas.insert(key.to_string(), area.totals);
                aggregation.skipped.extend(area.skipped);
            }
            Err(e) => {
                if first_error
                    .as_ref()
                    .is_none_or(|first| error_order(&e) < error_order(first))
                {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    aggregation.skipped.sort_by_key(|skipped| skipped.row);

    log::info!(
        "Aggregated {} rows into {} areas ({} skipped)",
        rows.len(),
        aggregation.areas.len(),
        aggregation.skipped.len()
    );

    Ok(aggregation)
}

/// Row errors sort by row index, ahead of errors not tied to a row.
fn error_order(error: &AggregateError) -> usize {
    error.row().unwrap_or(usize::MAX)
}

/// Every subgroup name that appears in any row, sorted.
fn collect_subgroups(rows: &[OverlapRow]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.values.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Row indices per target key, keys sorted, indices in input order.
fn group_rows(rows: &[OverlapRow]) -> Vec<(&str, Vec<usize>)> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        groups.entry(row.target_key.as_str()).or_default().push(index);
    }
    groups.into_iter().collect()
}

struct FoldedArea {
    totals: AreaTotals,
    skipped: Vec<SkippedRow>,
}

fn fold_area<'a>(
    rows: &'a [OverlapRow],
    key: &str,
    indices: &[usize],
    subgroups: &[String],
    policy: GeometryErrorPolicy,
) -> Result<FoldedArea, AggregateError> {
    let mut accumulator = Accumulator::new(subgroups);
    let mut targets: BTreeMap<&'a str, Result<Polygon, GeometryParseError>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for &index in indices {
        let row = &rows[index];
        match row_fraction(index, row, &mut targets) {
            Ok(fraction) => accumulator.add(index, row, fraction),
            Err(e) => match policy {
                GeometryErrorPolicy::Abort => return Err(e),
                GeometryErrorPolicy::Skip => {
                    log::warn!("Skipping {e}");
                    skipped.push(SkippedRow {
                        row: index,
                        target_key: row.target_key.clone(),
                        source_key: row.source_key.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    Ok(FoldedArea {
        totals: accumulator.finish(key)?,
        skipped,
    })
}

/// Parses a row's geometries and computes its overlap fraction. Target
/// polygons are parsed once per distinct WKT string.
fn row_fraction<'a>(
    index: usize,
    row: &'a OverlapRow,
    targets: &mut BTreeMap<&'a str, Result<Polygon, GeometryParseError>>,
) -> Result<f64, AggregateError> {
    let geometry_error = |role, source| AggregateError::Geometry {
        row: index,
        target_key: row.target_key.clone(),
        source_key: row.source_key.clone(),
        role,
        source,
    };

    let source = parse(&row.source_wkt).map_err(|e| geometry_error(GeometryRole::Source, e))?;

    let target = targets
        .entry(row.target_wkt.as_str())
        .or_insert_with(|| parse(&row.target_wkt))
        .as_ref()
        .map_err(|e| geometry_error(GeometryRole::Target, e.clone()))?;

    let fraction =
        overlap_fraction(&source, target).map_err(|source| AggregateError::Degenerate {
            row: index,
            target_key: row.target_key.clone(),
            source_key: row.source_key.clone(),
            source,
        })?;

    log::trace!(
        "Row {index}: {:.4} of {:?} lies in '{}'",
        fraction,
        row.source_key,
        row.target_key
    );

    Ok(fraction)
}

/// Running sums for one target area.
struct Accumulator {
    sums: BTreeMap<String, f64>,
    contributions: Vec<Contribution>,
}

impl Accumulator {
    fn new(subgroups: &[String]) -> Self {
        Self {
            sums: subgroups.iter().map(|name| (name.clone(), 0.0)).collect(),
            contributions: Vec::new(),
        }
    }

    fn add(&mut self, index: usize, row: &OverlapRow, fraction: f64) {
        for (subgroup, sum) in &mut self.sums {
            match row.values.get(subgroup).and_then(MeasureValue::as_number) {
                Some(value) => *sum += value * fraction,
                None => log::debug!(
                    "Row {index} ('{}'): no numeric '{subgroup}' value, contributing zero",
                    row.target_key
                ),
            }
        }

        self.contributions.push(Contribution {
            source_key: row.source_key.clone(),
            fraction,
        });
    }

    fn finish(self, target_key: &str) -> Result<AreaTotals, AggregateError> {
        let totals = self
            .sums
            .into_iter()
            .map(|(subgroup, sum)| match round_total(sum) {
                Some(total) => Ok((subgroup, total)),
                None => Err(AggregateError::TotalOutOfRange {
                    target_key: target_key.to_string(),
                    subgroup,
                    sum,
                }),
            })
            .collect::<Result<_, _>>()?;

        Ok(AreaTotals {
            totals,
            contributions: self.contributions,
        })
    }
}

/// 2^63, the first value past `i64::MAX` that an `f64` represents exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Rounds half-to-even to a whole number, or `None` if the result does not
/// fit in an `i64`.
#[allow(clippy::cast_possible_truncation)]
fn round_total(sum: f64) -> Option<i64> {
    let rounded = sum.round_ties_even();
    (rounded >= -I64_BOUND && rounded < I64_BOUND).then_some(rounded as i64)
}
