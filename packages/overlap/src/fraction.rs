//! Fraction of a source polygon's area covered by a target polygon.

use census_overlay_geometry::Polygon;
use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Relate};

use crate::OverlapError;

/// Returns `area(source ∩ target) / area(source)`, in `[0, 1]`.
///
/// Polygons that are disjoint or only share boundary edges or points yield
/// exactly `0.0`; a source covered by the target yields exactly `1.0`.
/// Ring winding of either input does not affect the result, and identical
/// inputs always produce bit-identical output.
///
/// # Errors
///
/// Returns [`OverlapError::DegeneratePolygon`] if the source area is exactly
/// zero. There is no tolerance: a sliver with a tiny positive area is a valid
/// source and is weighted like any other.
pub fn overlap_fraction(source: &Polygon, target: &Polygon) -> Result<f64, OverlapError> {
    let source_area = source.area();
    if source_area <= 0.0 {
        return Err(OverlapError::DegeneratePolygon);
    }

    let target_area = target.area();
    let (source_parts, target_parts) = (source.as_multi_polygon(), target.as_multi_polygon());
    if target_area <= 0.0 || !envelopes_intersect(source_parts, target_parts) {
        return Ok(0.0);
    }

    // Boundary-only contact must not leak a sliver of area from clipping.
    let matrix = source_parts.relate(target_parts);
    if !matrix.is_intersects() || matrix.is_touches() {
        return Ok(0.0);
    }
    if matrix.is_coveredby() {
        return Ok(1.0);
    }
    if matrix.is_covers() {
        return Ok((target_area / source_area).clamp(0.0, 1.0));
    }

    let intersection = source
        .oriented()
        .as_multi_polygon()
        .intersection(target.oriented().as_multi_polygon());

    log::trace!(
        "Intersection has {} part(s) for source area {source_area}",
        intersection.0.len()
    );

    Ok((intersection.unsigned_area() / source_area).clamp(0.0, 1.0))
}

fn envelopes_intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use census_overlay_geometry::parse;

    use super::*;

    const BIG: &str = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))";
    const SMALL: &str = "POLYGON ((2 2, 4 2, 4 4, 2 4, 2 2))";

    fn polygon(wkt: &str) -> Polygon {
        parse(wkt).unwrap()
    }

    fn fraction(source: &str, target: &str) -> f64 {
        overlap_fraction(&polygon(source), &polygon(target)).unwrap()
    }

    #[test]
    fn polygon_fully_overlaps_itself() {
        for wkt in [
            BIG,
            SMALL,
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 4, 4 4, 4 2, 2 2))",
            "POLYGON ((0 0, 7 1, 3 8, 0 0))",
        ] {
            assert!((fraction(wkt, wkt) - 1.0).abs() < 1e-9, "{wkt}");
        }
    }

    #[test]
    fn disjoint_polygons_do_not_overlap() {
        let far = "POLYGON ((20 20, 30 20, 30 30, 20 30, 20 20))";
        assert!(fraction(BIG, far) == 0.0);
        assert!(fraction(far, BIG) == 0.0);
    }

    #[test]
    fn envelope_overlap_without_area_overlap_is_zero() {
        let triangle = "POLYGON ((0 0, 10 0, 0 10, 0 0))";
        let opposite = "POLYGON ((10 10, 9 10, 10 9, 10 10))";
        assert!(fraction(triangle, opposite) == 0.0);
    }

    #[test]
    fn small_square_inside_big_square() {
        assert!(fraction(SMALL, BIG) == 1.0);
        assert!((fraction(BIG, SMALL) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn half_overlap() {
        let shifted = "POLYGON ((5 0, 15 0, 15 10, 5 10, 5 0))";
        assert!((fraction(BIG, shifted) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn shared_edge_is_zero() {
        let neighbour = "POLYGON ((10 0, 20 0, 20 10, 10 10, 10 0))";
        assert!(fraction(BIG, neighbour) == 0.0);
    }

    #[test]
    fn shared_corner_is_zero() {
        let diagonal = "POLYGON ((10 10, 20 10, 20 20, 10 20, 10 10))";
        assert!(fraction(BIG, diagonal) == 0.0);
    }

    #[test]
    fn winding_order_does_not_matter() {
        let shifted_ccw = "POLYGON ((5 3, 15 3, 15 13, 5 13, 5 3))";
        let shifted_cw = "POLYGON ((5 3, 5 13, 15 13, 15 3, 5 3))";
        let big_cw = "POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))";

        let expected = fraction(BIG, shifted_ccw);
        assert!((expected - 0.35).abs() < 1e-9);
        assert!((fraction(big_cw, shifted_ccw) - expected).abs() < 1e-12);
        assert!((fraction(BIG, shifted_cw) - expected).abs() < 1e-12);
        assert!((fraction(big_cw, shifted_cw) - expected).abs() < 1e-12);
    }

    #[test]
    fn source_in_target_hole_is_zero() {
        let donut = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 8, 8 8, 8 2, 2 2))";
        let inside_hole = "POLYGON ((3 3, 7 3, 7 7, 3 7, 3 3))";
        assert!(fraction(inside_hole, donut) == 0.0);
    }

    #[test]
    fn holes_reduce_covered_area() {
        let donut = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 8, 8 8, 8 2, 2 2))";
        assert!((fraction(BIG, donut) - 0.64).abs() < 1e-9);

        let left_half = "POLYGON ((0 0, 5 0, 5 10, 0 10, 0 0))";
        assert!((fraction(left_half, donut) - 0.64).abs() < 1e-9);
    }

    #[test]
    fn multipolygon_source_sums_parts() {
        let two_squares =
            "MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)), ((20 20, 22 20, 22 22, 20 22, 20 20)))";
        assert!((fraction(two_squares, BIG) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fraction_stays_in_unit_interval() {
        let shapes = [
            BIG,
            SMALL,
            "POLYGON ((5 0, 15 0, 15 10, 5 10, 5 0))",
            "POLYGON ((-3 -3, 3 -3, 3 3, -3 3, -3 -3))",
            "POLYGON ((1 1, 9 2, 5 9, 1 1))",
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 8, 8 8, 8 2, 2 2))",
        ];
        for source in shapes {
            for target in shapes {
                let f = fraction(source, target);
                assert!((0.0..=1.0).contains(&f), "{source} vs {target}: {f}");
            }
        }
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let source = polygon("POLYGON ((1 1, 9 2, 5 9, 1 1))");
        let target = polygon("POLYGON ((5 0, 15 0, 15 10, 5 10, 5 0))");
        let first = overlap_fraction(&source, &target).unwrap();
        let second = overlap_fraction(&source, &target).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn point_collapsed_source_is_degenerate() {
        let point = polygon("POLYGON ((1 1, 1 1, 1 1, 1 1))");
        assert_eq!(
            overlap_fraction(&point, &polygon(BIG)),
            Err(OverlapError::DegeneratePolygon)
        );
    }

    #[test]
    fn line_collapsed_source_is_degenerate() {
        let line = polygon("POLYGON ((0 0, 5 5, 10 10, 0 0))");
        assert_eq!(
            overlap_fraction(&line, &polygon(BIG)),
            Err(OverlapError::DegeneratePolygon)
        );
    }

    #[test]
    fn tiny_positive_area_source_is_not_degenerate() {
        let sliver = polygon(
            "POLYGON ((1 1, 1.000000000001 1, 1.000000000001 1.000000000001, 1 1.000000000001, 1 1))",
        );
        assert!(sliver.area() > 0.0);
        assert_eq!(overlap_fraction(&sliver, &polygon(BIG)), Ok(1.0));
    }

    #[test]
    fn degenerate_target_covers_nothing() {
        let line = polygon("POLYGON ((0 0, 5 5, 10 10, 0 0))");
        assert!(overlap_fraction(&polygon(BIG), &line).unwrap() == 0.0);
    }
}
