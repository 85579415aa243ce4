//! Nearest grid cell lookup for feature centroids.
//!
//! The lookup is separable: latitude and longitude indices are chosen
//! independently as the closest value on their own axis. On an axis-aligned,
//! regularly spaced grid this is the cell whose center is closest to the point.
//! It is not a geodesic nearest neighbour, and longitudes are compared as plain
//! numbers (a `0..360` grid is not matched against `-180..180` points).

use crate::grid::axis::GridAxis;
use crate::grid::error::GridError;
use crate::grid::snapshot::GridSnapshot;
use crate::types::feature::Feature;
use crate::types::lat_lon::LatLon;
use log::debug;
use ordered_float::OrderedFloat;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Position of a cell in a grid's `(lat, lon)` index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub lat_index: usize,
    pub lon_index: usize,
}

/// The cell a feature resolved to in one grid, with its center and the
/// great-circle distance from the feature's centroid to that center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestAssignment {
    pub cell: CellIndex,
    pub cell_center: LatLon,
    pub distance_km: f64,
}

/// Index of the axis value closest to `value`. Ties go to the lower index.
pub fn nearest_index(axis: &[f64], value: f64) -> Result<usize, GridError> {
    if !value.is_finite() {
        return Err(GridError::invalid(format!(
            "query coordinate {} is not finite",
            value
        )));
    }
    // `min_by_key` keeps the first of equal minima.
    axis.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by_key(|(_, v)| OrderedFloat((*v - value).abs()))
        .map(|(i, _)| i)
        .ok_or_else(|| GridError::invalid("axis has no usable values"))
}

pub fn resolve(
    lat_axis: &GridAxis,
    lon_axis: &GridAxis,
    point: LatLon,
) -> Result<CellIndex, GridError> {
    Ok(CellIndex {
        lat_index: nearest_index(lat_axis.values(), point.lat())?,
        lon_index: nearest_index(lon_axis.values(), point.lon())?,
    })
}

pub fn assign(
    lat_axis: &GridAxis,
    lon_axis: &GridAxis,
    point: LatLon,
) -> Result<NearestAssignment, GridError> {
    let cell = resolve(lat_axis, lon_axis, point)?;
    // Indices come from the axes themselves, so both lookups succeed.
    let cell_center = LatLon(
        lat_axis.values()[cell.lat_index],
        lon_axis.values()[cell.lon_index],
    );
    Ok(NearestAssignment {
        cell,
        cell_center,
        distance_km: point.distance_km(cell_center),
    })
}

/// Identity of a grid layout, hashed from every value of both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSignature {
    lat_len: usize,
    lon_len: usize,
    digest: u64,
}

impl GridSignature {
    pub fn of(lat_axis: &GridAxis, lon_axis: &GridAxis) -> Self {
        let mut hasher = DefaultHasher::new();
        for v in lat_axis.values().iter().chain(lon_axis.values()) {
            v.to_bits().hash(&mut hasher);
        }
        Self {
            lat_len: lat_axis.len(),
            lon_len: lon_axis.len(),
            digest: hasher.finish(),
        }
    }
}

/// Memoises the assignments of one fixed feature list per grid layout.
///
/// Daily files of a month normally share their axes, so features are resolved
/// once per month instead of once per day. A cache must only ever be used with
/// the same feature slice; it is dropped with the month it belongs to.
#[derive(Debug, Default)]
pub struct AssignmentCache {
    by_grid: HashMap<GridSignature, Vec<NearestAssignment>>,
}

impl AssignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignments(
        &mut self,
        snapshot: &GridSnapshot,
        features: &[Feature],
    ) -> Result<&[NearestAssignment], GridError> {
        let signature = GridSignature::of(snapshot.lat_axis(), snapshot.lon_axis());
        if !self.by_grid.contains_key(&signature) {
            let resolved = features
                .iter()
                .map(|feature| {
                    let assignment =
                        assign(snapshot.lat_axis(), snapshot.lon_axis(), feature.centroid())?;
                    debug!(
                        "Feature '{}' resolved to cell ({}, {}) at {:?}, {:.2} km from centroid",
                        feature.name(),
                        assignment.cell.lat_index,
                        assignment.cell.lon_index,
                        assignment.cell_center,
                        assignment.distance_km
                    );
                    Ok(assignment)
                })
                .collect::<Result<Vec<_>, GridError>>()?;
            self.by_grid.insert(signature, resolved);
        }
        Ok(self.by_grid[&signature].as_slice())
    }

    /// Number of distinct grid layouts seen.
    pub fn len(&self) -> usize {
        self.by_grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_grid.is_empty()
    }
}
