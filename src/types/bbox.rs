//! Bounding boxes of feature collections and the integer-degree area sent to the data provider.

use serde::Serialize;

/// Axis-aligned bounds in degrees, ordered like GeoJSON `bbox` members:
/// `min_lon, min_lat, max_lon, max_lat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn union(self, other: BoundingBox) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Widens the box outwards to whole degrees: north/east are rounded up,
    /// south/west are rounded down. The provider only accepts integer areas.
    pub fn request_area(&self) -> RequestArea {
        RequestArea {
            north: self.max_lat.ceil() as i32,
            west: self.min_lon.floor() as i32,
            south: self.min_lat.floor() as i32,
            east: self.max_lon.ceil() as i32,
        }
    }
}

/// Download area in whole degrees. Serializes as `[north, west, south, east]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestArea {
    pub north: i32,
    pub west: i32,
    pub south: i32,
    pub east: i32,
}

impl RequestArea {
    pub fn as_array(&self) -> [i32; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

impl Serialize for RequestArea {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_array().serialize(serializer)
    }
}
