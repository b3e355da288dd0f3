//! WKT text to [`Polygon`].
//!
//! Tokenizing is handled by the `wkt` crate; this module rejects anything
//! that is not polygonal and hands the result to [`Polygon`]'s validation.

use geo::{Geometry, MultiPolygon};
use wkt::TryFromWkt;

use crate::{GeometryParseError, Polygon};

/// Parses a WKT `POLYGON` or `MULTIPOLYGON` string.
///
/// A `POLYGON` becomes a single-part [`Polygon`]; each member of a
/// `MULTIPOLYGON` becomes one part. Rings written without their closing
/// point are closed.
///
/// # Errors
///
/// Returns [`GeometryParseError`] if the text is blank, has unbalanced
/// parentheses, is not well-formed WKT, is not polygonal, or contains a
/// ring that is too short or has non-finite coordinates.
pub fn parse(wkt: &str) -> Result<Polygon, GeometryParseError> {
    let text = wkt.trim();
    if text.is_empty() {
        return Err(GeometryParseError::Empty);
    }

    if let Some(end) = check_parentheses(text)? {
        let rest = text[end..].trim_start();
        if !rest.is_empty() {
            return Err(GeometryParseError::Syntax {
                message: format!("unexpected text after geometry at byte {end}: '{rest}'"),
            });
        }
    }

    let geometry = Geometry::<f64>::try_from_wkt_str(text).map_err(|e| {
        GeometryParseError::Syntax {
            message: e.to_string(),
        }
    })?;

    let parts = match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(parts) => parts,
        other => {
            return Err(GeometryParseError::Unsupported {
                kind: geometry_kind(&other),
            });
        }
    };

    log::trace!("Parsed WKT into {} polygon part(s)", parts.0.len());

    Polygon::try_from(parts)
}

/// Rejects text whose parentheses do not pair up.
///
/// Returns the byte offset just past the parenthesis that closes the first
/// outermost group, or `None` if the text has no parentheses.
fn check_parentheses(text: &str) -> Result<Option<usize>, GeometryParseError> {
    let mut depth = 0usize;
    let mut first_close = None;
    for (offset, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(GeometryParseError::UnbalancedParentheses { offset })?;
                if depth == 0 && first_close.is_none() {
                    first_close = Some(offset + 1);
                }
            }
            _ => {}
        }
    }

    if depth == 0 {
        Ok(first_close)
    } else {
        Err(GeometryParseError::UnbalancedParentheses { offset: text.len() })
    }
}

/// WKT keyword for a geometry variant.
const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        Geometry::Rect(_) => "RECT",
        Geometry::Triangle(_) => "TRIANGLE",
    }
}
