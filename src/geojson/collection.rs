//! Serde model of a GeoJSON FeatureCollection.
//!
//! Only the members the pipeline reads are typed. Everything else (ids, `bbox`,
//! CRS members, nested properties) is kept in `foreign_members` or the
//! untyped `properties` map so a loaded collection writes back unchanged.

use crate::geojson::centroid::centroid;
use crate::geojson::error::GeoJsonError;
use crate::types::bbox::BoundingBox;
use crate::types::feature::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// `[longitude, latitude]` with an optional altitude.
pub type Position = Vec<f64>;

pub const NAME_PROPERTY: &str = "name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Calls `f` with every `(lon, lat)` vertex.
    pub fn for_each_position(&self, f: &mut impl FnMut(f64, f64)) {
        match self {
            Geometry::Point { coordinates } => visit(coordinates, f),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().for_each(|p| visit(p, f))
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(|p| visit(p, f))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| visit(p, f)),
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.for_each_position(f);
                }
            }
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        self.for_each_position(&mut |lon, lat| {
            if let Some(b) = bounds.as_mut() {
                b.extend(lon, lat);
            } else {
                bounds = Some(BoundingBox::from_point(lon, lat));
            }
        });
        bounds
    }
}

/// Positions with fewer than two ordinates are ignored.
fn visit(position: &Position, f: &mut impl FnMut(f64, f64)) {
    if let [lon, lat, ..] = position.as_slice() {
        f(*lon, *lat);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl GeoFeature {
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties: Some(properties),
            foreign_members: Map::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(NAME_PROPERTY))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<GeoFeature>,
    #[serde(flatten)]
    pub foreign_members: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
            foreign_members: Map::new(),
        }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, GeoJsonError> {
        let collection: FeatureCollection =
            serde_json::from_reader(reader).map_err(GeoJsonError::Parse)?;
        if collection.kind != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection(collection.kind));
        }
        Ok(collection)
    }

    pub fn from_path(path: &Path) -> Result<Self, GeoJsonError> {
        let file =
            std::fs::File::open(path).map_err(|e| GeoJsonError::Read(path.to_path_buf(), e))?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), GeoJsonError> {
        let json = serde_json::to_vec_pretty(self).map_err(GeoJsonError::Serialize)?;
        std::fs::write(path, json).map_err(|e| GeoJsonError::Write(path.to_path_buf(), e))
    }

    /// Derives the named centroids the aggregation works on, in collection order.
    pub fn to_features(&self) -> Result<Vec<Feature>, GeoJsonError> {
        self.features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let name = feature.name().ok_or(GeoJsonError::MissingName { index })?;
                let geometry =
                    feature
                        .geometry
                        .as_ref()
                        .ok_or_else(|| GeoJsonError::MissingGeometry {
                            name: name.to_string(),
                        })?;
                let point = centroid(geometry).ok_or_else(|| GeoJsonError::EmptyGeometry {
                    name: name.to_string(),
                })?;
                Ok(Feature::new(name, point))
            })
            .collect()
    }

    /// Bounds over every geometry of the collection, `None` when there are no vertices.
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(Geometry::bounds)
            .reduce(BoundingBox::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lat_lon::LatLon;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "type": "FeatureCollection",
            "name": "test_features",
            "features": [
                {
                    "type": "Feature",
                    "id": 7,
                    "properties": { "name": "square", "crop": "wheat" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[4.0, 52.0], [5.0, 52.0], [5.0, 53.0], [4.0, 53.0], [4.0, 52.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "well" },
                    "geometry": { "type": "Point", "coordinates": [6.5, 51.25] }
                }
            ]
        })
    }

    #[test]
    fn test_parse_and_derive_features() {
        let collection = FeatureCollection::from_reader(sample().to_string().as_bytes()).unwrap();
        let features = collection.to_features().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name(), "square");
        let square = features[0].centroid();
        assert!((square.lat() - 52.5).abs() < 1e-9 && (square.lon() - 4.5).abs() < 1e-9);
        assert_eq!(features[1].centroid(), LatLon(51.25, 6.5));
    }

    #[test]
    fn test_total_bounds() {
        let collection = FeatureCollection::from_reader(sample().to_string().as_bytes()).unwrap();
        let bounds = collection.total_bounds().unwrap();
        assert_eq!(
            bounds,
            BoundingBox {
                min_lon: 4.0,
                min_lat: 51.25,
                max_lon: 6.5,
                max_lat: 53.0
            }
        );
        assert_eq!(bounds.request_area().as_array(), [53, 4, 51, 7]);
    }

    #[test]
    fn test_foreign_members_round_trip() {
        let collection = FeatureCollection::from_reader(sample().to_string().as_bytes()).unwrap();
        let written = serde_json::to_value(&collection).unwrap();
        assert_eq!(written, sample());
    }

    #[test]
    fn test_missing_name_and_geometry() {
        let no_name = json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": null }]
        });
        let collection = FeatureCollection::from_reader(no_name.to_string().as_bytes()).unwrap();
        assert!(matches!(
            collection.to_features(),
            Err(GeoJsonError::MissingName { index: 0 })
        ));

        let no_geometry = json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": { "name": "x" }, "geometry": null }]
        });
        let collection =
            FeatureCollection::from_reader(no_geometry.to_string().as_bytes()).unwrap();
        assert!(matches!(
            collection.to_features(),
            Err(GeoJsonError::MissingGeometry { .. })
        ));
    }

    #[test]
    fn test_rejects_other_top_level_types() {
        let point = json!({ "type": "Feature", "features": [] });
        assert!(matches!(
            FeatureCollection::from_reader(point.to_string().as_bytes()),
            Err(GeoJsonError::NotAFeatureCollection(kind)) if kind == "Feature"
        ));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let collection = FeatureCollection::from_reader(sample().to_string().as_bytes()).unwrap();
        collection.write_to_path(&path).unwrap();
        assert_eq!(FeatureCollection::from_path(&path).unwrap(), collection);
    }
}
