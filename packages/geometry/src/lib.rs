#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! WKT polygon parsing for area-weighted reaggregation.
//!
//! Turns `POLYGON` and `MULTIPOLYGON` well-known-text into a validated
//! [`Polygon`]: every ring closed, at least four points per ring, every
//! coordinate finite. Ring and point order are kept exactly as written so
//! downstream area and clipping code never has to deal with text quirks.

pub mod parse;
pub mod polygon;

pub use parse::parse;
pub use polygon::Polygon;

use thiserror::Error;

/// Minimum number of points in a closed ring (three distinct points plus the
/// closing point).
pub const MIN_RING_POINTS: usize = 4;

/// Errors that can occur while turning WKT text into a [`Polygon`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryParseError {
    /// The input is not well-formed WKT.
    #[error("Malformed WKT: {message}")]
    Syntax {
        /// Description of what the tokenizer rejected.
        message: String,
    },

    /// Opening and closing parentheses do not pair up.
    #[error("Malformed WKT: unbalanced parentheses at byte {offset}")]
    UnbalancedParentheses {
        /// Byte offset where the imbalance was detected.
        offset: usize,
    },

    /// The input contains no polygon at all.
    #[error("Empty geometry")]
    Empty,

    /// The input is valid WKT but not a polygonal geometry.
    #[error("Unsupported geometry type: {kind}")]
    Unsupported {
        /// WKT keyword of the geometry that was found.
        kind: &'static str,
    },

    /// A ring has fewer than [`MIN_RING_POINTS`] points.
    #[error(
        "Ring {ring} of part {part} has {points} points, need at least {}",
        MIN_RING_POINTS
    )]
    RingTooShort {
        /// Zero-based polygon index within the geometry.
        part: usize,
        /// Zero-based ring index within the part (0 is the outer ring).
        ring: usize,
        /// Number of points found.
        points: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("Ring {ring} of part {part} contains a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Zero-based polygon index within the geometry.
        part: usize,
        /// Zero-based ring index within the part (0 is the outer ring).
        ring: usize,
    },
}
