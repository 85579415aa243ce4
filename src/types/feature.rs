use crate::types::lat_lon::LatLon;

/// A named location whose temperature is aggregated.
///
/// The centroid is derived once when the feature collection is loaded and is
/// the only geometry the aggregation ever looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    name: String,
    centroid: LatLon,
}

impl Feature {
    pub fn new(name: impl Into<String>, centroid: LatLon) -> Self {
        Self {
            name: name.into(),
            centroid,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn centroid(&self) -> LatLon {
        self.centroid
    }
}
