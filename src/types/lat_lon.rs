use haversine::{distance, Location as HaversineLocation, Units};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64` decimal degrees.
///
/// # Examples
///
/// ```
/// use geotemp::LatLon;
///
/// let berlin_center = LatLon(52.5200, 13.4050);
/// assert_eq!(berlin_center.lat(), 52.5200);
/// assert_eq!(berlin_center.lon(), 13.4050);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn lat(self) -> f64 {
        self.0
    }
    pub fn lon(self) -> f64 {
        self.1
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(self, other: LatLon) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.0,
                longitude: self.1,
            },
            HaversineLocation {
                latitude: other.0,
                longitude: other.1,
            },
            Units::Kilometers,
        )
    }
}
