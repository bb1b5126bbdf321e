use geo::Point;
use serde_json::{Map, Value, json};

use crate::Mmsi;

/// Render-ready snapshot of a single vessel: a point geometry plus the
/// flattened attribute set the renderer styles icons and labels from.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselFeature {
    pub mmsi: Mmsi,
    pub geometry: Point<f64>,
    pub properties: Map<String, Value>,
}

impl VesselFeature {
    /// GeoJSON `Feature` representation, coordinates in lon/lat order.
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [self.geometry.x(), self.geometry.y()],
            },
            "properties": self.properties,
        })
    }
}

/// GeoJSON `FeatureCollection` over a set of vessel snapshots.
pub fn feature_collection<'a>(features: impl IntoIterator<Item = &'a VesselFeature>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features
            .into_iter()
            .map(VesselFeature::to_geojson)
            .collect::<Vec<_>>(),
    })
}
