//! Canonical polygon value shared by area and clipping computations.

use std::fmt;
use std::str::FromStr;

use geo::orient::{Direction, Orient};
use geo::{Area, LineString, MultiPolygon};
use wkt::ToWkt;

use crate::{GeometryParseError, MIN_RING_POINTS};

/// A validated, immutable polygonal geometry.
///
/// Holds one or more parts. Each part has an outer ring followed by zero or
/// more holes; every ring is closed, has at least [`MIN_RING_POINTS`] points
/// and only finite coordinates. Winding order is kept as given; use
/// [`Polygon::oriented`] for a copy in the default orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    parts: MultiPolygon<f64>,
}

impl Polygon {
    /// The polygon parts, in input order.
    #[must_use]
    pub fn parts(&self) -> &[geo::Polygon<f64>] {
        &self.parts.0
    }

    /// Number of parts (1 for a WKT `POLYGON`).
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.0.len()
    }

    /// Every ring of every part: outer ring first, then its holes.
    pub fn rings(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.parts
            .0
            .iter()
            .flat_map(|part| std::iter::once(part.exterior()).chain(part.interiors()))
    }

    /// Planar area: shoelace area of each outer ring minus its holes, summed
    /// over parts. Never negative.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.parts.unsigned_area()
    }

    /// Borrows the underlying `geo` geometry.
    #[must_use]
    pub const fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.parts
    }

    /// Consumes the polygon, returning the underlying `geo` geometry.
    #[must_use]
    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        self.parts
    }

    /// Copy with outer rings counter-clockwise and holes clockwise.
    #[must_use]
    pub fn oriented(&self) -> Self {
        Self {
            parts: self.parts.orient(Direction::Default),
        }
    }
}

impl TryFrom<MultiPolygon<f64>> for Polygon {
    type Error = GeometryParseError;

    fn try_from(parts: MultiPolygon<f64>) -> Result<Self, Self::Error> {
        if parts.0.is_empty() {
            return Err(GeometryParseError::Empty);
        }

        for (part, polygon) in parts.0.iter().enumerate() {
            if polygon.exterior().0.is_empty() {
                return Err(GeometryParseError::Empty);
            }

            let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
            for (ring, line) in rings.enumerate() {
                if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                    return Err(GeometryParseError::NonFiniteCoordinate { part, ring });
                }
                // `geo::Polygon` closes its rings on construction, so only
                // the length needs checking here.
                if line.0.len() < MIN_RING_POINTS {
                    return Err(GeometryParseError::RingTooShort {
                        part,
                        ring,
                        points: line.0.len(),
                    });
                }
            }
        }

        Ok(Self { parts })
    }
}

impl TryFrom<geo::Polygon<f64>> for Polygon {
    type Error = GeometryParseError;

    fn try_from(polygon: geo::Polygon<f64>) -> Result<Self, Self::Error> {
        Self::try_from(MultiPolygon::new(vec![polygon]))
    }
}

impl FromStr for Polygon {
    type Err = GeometryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse(s)
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts.0.as_slice() {
            [single] => f.write_str(&single.wkt_string()),
            _ => f.write_str(&self.parts.wkt_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Winding, polygon};

    use super::*;

    #[test]
    fn area_ignores_winding() {
        let ccw: Polygon = "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))".parse().unwrap();
        let cw: Polygon = "POLYGON ((0 0, 0 4, 4 4, 4 0, 0 0))".parse().unwrap();
        assert!((ccw.area() - 16.0).abs() < 1e-12);
        assert!((cw.area() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn oriented_makes_exterior_counter_clockwise() {
        let cw: Polygon = "POLYGON ((0 0, 0 4, 4 4, 4 0, 0 0))".parse().unwrap();
        let oriented = cw.oriented();
        assert!(oriented.parts()[0].exterior().is_ccw());
        assert!((oriented.area() - cw.area()).abs() < 1e-12);
    }

    #[test]
    fn try_from_geo_polygon_validates_rings() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        assert!(Polygon::try_from(square).is_ok());

        let sliver = geo::Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
            vec![],
        );
        assert_eq!(
            Polygon::try_from(sliver),
            Err(GeometryParseError::RingTooShort {
                part: 0,
                ring: 0,
                points: 3,
            })
        );
    }

    #[test]
    fn try_from_rejects_non_finite_coordinates() {
        let bad = geo::Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        assert_eq!(
            Polygon::try_from(bad),
            Err(GeometryParseError::NonFiniteCoordinate { part: 0, ring: 0 })
        );
    }

    #[test]
    fn try_from_rejects_empty_multipolygon() {
        assert_eq!(
            Polygon::try_from(MultiPolygon::<f64>::new(vec![])),
            Err(GeometryParseError::Empty)
        );
    }

    #[test]
    fn display_writes_wkt_keyword() {
        let single: Polygon = "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))".parse().unwrap();
        assert!(single.to_string().starts_with("POLYGON"));

        let multi: Polygon =
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)), ((5 5, 7 5, 7 7, 5 7, 5 5)))"
                .parse()
                .unwrap();
        assert!(multi.to_string().starts_with("MULTIPOLYGON"));
    }
}
