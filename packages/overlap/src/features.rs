//! `GeoJSON` hand-off for map rendering.
//!
//! Each aggregated area becomes one feature whose properties carry the area
//! name, one integer per subgroup, and the contribution breakdown. Display
//! geometry is supplied by the caller.

use std::collections::BTreeMap;

use census_overlay_geometry::{Polygon, parse};
use census_overlay_overlap_models::{Aggregation, AreaTotals, OverlapRow};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::json;

/// Builds a feature collection with one feature per aggregated area, in key
/// order. Areas without an entry in `geometries` get a null geometry.
#[must_use]
pub fn feature_collection(
    aggregation: &Aggregation,
    geometries: &BTreeMap<String, Polygon>,
) -> FeatureCollection {
    let features = aggregation
        .areas
        .iter()
        .map(|(key, area)| area_feature(key, area, geometries.get(key)))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Display geometry per target key, taken from the first row of each key
/// whose target WKT parses.
#[must_use]
pub fn display_geometries(rows: &[OverlapRow]) -> BTreeMap<String, Polygon> {
    let mut geometries = BTreeMap::new();
    for row in rows {
        if geometries.contains_key(&row.target_key) {
            continue;
        }
        match parse(&row.target_wkt) {
            Ok(polygon) => {
                geometries.insert(row.target_key.clone(), polygon);
            }
            Err(e) => log::warn!("No display geometry from row for '{}': {e}", row.target_key),
        }
    }
    geometries
}

fn area_feature(key: &str, area: &AreaTotals, geometry: Option<&Polygon>) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("areaname".to_string(), json!(key));
    for (subgroup, total) in &area.totals {
        properties.insert(subgroup.clone(), json!(total));
    }
    properties.insert(
        "contributions".to_string(),
        area.contributions
            .iter()
            .map(|c| json!({ "source": c.source_key, "percent": c.percent() }))
            .collect(),
    );

    Feature {
        bbox: None,
        geometry: geometry.map(to_geojson),
        id: Some(Id::String(key.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn to_geojson(polygon: &Polygon) -> Geometry {
    let value = match polygon.parts() {
        [single] => geojson::Value::from(single),
        _ => geojson::Value::from(polygon.as_multi_polygon()),
    };
    Geometry::new(value)
}
