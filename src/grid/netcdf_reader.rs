//! NetCDF-backed [`GridReader`], compiled with the `netcdf` feature.
//!
//! Expects the layout of the AgERA5 daily files: 1-D `lat` and `lon`
//! coordinate variables and a scalar field dimensioned `[time][lat][lon]`
//! (or `[lat][lon]`). Only the first time step is read.

use crate::grid::axis::GridAxis;
use crate::grid::error::GridError;
use crate::grid::reader::GridReader;
use crate::grid::snapshot::GridSnapshot;
use crate::types::month::date_from_file_name;
use bon::bon;
use std::path::Path;

pub const DEFAULT_FIELD_VARIABLE: &str = "Temperature_Air_2m_Mean_24h";

#[derive(Debug, Clone)]
pub struct NetCdfReader {
    lat_variable: String,
    lon_variable: String,
    field_variable: String,
}

#[bon]
impl NetCdfReader {
    /// Variable names default to `lat`, `lon` and [`DEFAULT_FIELD_VARIABLE`].
    #[builder]
    pub fn new(
        lat_variable: Option<&str>,
        lon_variable: Option<&str>,
        field_variable: Option<&str>,
    ) -> Self {
        Self {
            lat_variable: lat_variable.unwrap_or("lat").to_string(),
            lon_variable: lon_variable.unwrap_or("lon").to_string(),
            field_variable: field_variable.unwrap_or(DEFAULT_FIELD_VARIABLE).to_string(),
        }
    }
}

impl Default for NetCdfReader {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl NetCdfReader {
    fn read_axis(file: &netcdf::File, name: &str, path: &Path) -> Result<GridAxis, GridError> {
        let var = file
            .variable(name)
            .ok_or_else(|| GridError::unreadable(path, format!("missing variable '{}'", name)))?;
        let values: Vec<f64> = var
            .get_values(..)
            .map_err(|e| GridError::unreadable(path, format!("reading '{}': {}", name, e)))?;
        GridAxis::new(values)
            .map_err(|e| GridError::unreadable(path, format!("'{}': {}", name, e)))
    }

    fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
        var.attribute_value(name)
            .and_then(|r| r.ok())
            .and_then(|v| match v {
                netcdf::AttributeValue::Double(d) => Some(d),
                netcdf::AttributeValue::Float(f) => Some(f as f64),
                netcdf::AttributeValue::Short(s) => Some(s as f64),
                netcdf::AttributeValue::Int(i) => Some(i as f64),
                _ => None,
            })
    }
}

impl GridReader for NetCdfReader {
    fn open(&self, path: &Path) -> Result<GridSnapshot, GridError> {
        let file = netcdf::open(path).map_err(|e| GridError::unreadable(path, e))?;

        let lat_axis = Self::read_axis(&file, &self.lat_variable, path)?;
        let lon_axis = Self::read_axis(&file, &self.lon_variable, path)?;

        let var = file.variable(&self.field_variable).ok_or_else(|| {
            GridError::unreadable(
                path,
                format!("missing variable '{}'", self.field_variable),
            )
        })?;

        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let trailing = match dims.as_slice() {
            [.., lat_len, lon_len] => (*lat_len, *lon_len),
            _ => {
                return Err(GridError::unreadable(
                    path,
                    format!("'{}' has {} dimensions", self.field_variable, dims.len()),
                ))
            }
        };
        if trailing != (lat_axis.len(), lon_axis.len()) {
            return Err(GridError::unreadable(
                path,
                format!(
                    "'{}' is shaped {:?}, expected [.., {}, {}]",
                    self.field_variable,
                    dims,
                    lat_axis.len(),
                    lon_axis.len()
                ),
            ));
        }

        let scale = Self::attr_f64(&var, "scale_factor").unwrap_or(1.0);
        let offset = Self::attr_f64(&var, "add_offset").unwrap_or(0.0);
        let fill = Self::attr_f64(&var, "_FillValue");
        let missing = Self::attr_f64(&var, "missing_value");

        let raw: Vec<f64> = var.get_values(..).map_err(|e| {
            GridError::unreadable(path, format!("reading '{}': {}", self.field_variable, e))
        })?;
        let cells = lat_axis.len() * lon_axis.len();
        let values = raw
            .into_iter()
            .take(cells)
            .map(|v| {
                if Some(v) == fill || Some(v) == missing || !v.is_finite() || v.abs() > 1e30 {
                    f64::NAN
                } else {
                    v * scale + offset
                }
            })
            .collect();

        let date = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(date_from_file_name);
        GridSnapshot::new(date, lat_axis, lon_axis, values)
            .map_err(|e| GridError::unreadable(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    const FILL: f64 = -9999.0;
    const MISSING: f64 = -8888.0;

    /// Writes `lat`, `lon = [100, 110, 120]` and a field packed as
    /// `raw * 0.5 + 250` with the given dimensions.
    fn write_grid(
        dir: &Path,
        name: &str,
        lat: &[f64],
        field_dims: &[&str],
        raw: &[f64],
    ) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("time", 2).unwrap();
        file.add_dimension("lat", lat.len()).unwrap();
        file.add_dimension("lon", 3).unwrap();
        {
            let mut var = file.add_variable::<f64>("lat", &["lat"]).unwrap();
            var.put_values(lat, ..).unwrap();
        }
        {
            let mut var = file.add_variable::<f64>("lon", &["lon"]).unwrap();
            var.put_values(&[100.0, 110.0, 120.0], ..).unwrap();
        }
        {
            let mut var = file
                .add_variable::<f64>(DEFAULT_FIELD_VARIABLE, field_dims)
                .unwrap();
            var.put_attribute("_FillValue", FILL).unwrap();
            var.put_attribute("missing_value", MISSING).unwrap();
            var.put_attribute("scale_factor", 0.5).unwrap();
            var.put_attribute("add_offset", 250.0).unwrap();
            var.put_values(raw, ..).unwrap();
        }
        path
    }

    fn two_days() -> Vec<f64> {
        let mut raw = vec![80.0, FILL, 84.0, MISSING, 90.0, 100.0];
        raw.extend([0.0; 6]);
        raw
    }

    fn reason_of(err: GridError, expected_path: &Path) -> String {
        match err {
            GridError::UnreadableGrid { path, reason } => {
                assert_eq!(path, expected_path);
                reason
            }
            other => panic!("expected UnreadableGrid, got {:?}", other),
        }
    }

    #[test]
    fn test_first_step_is_unpacked() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            dir.path(),
            "t2m_20230701.nc",
            &[10.0, 20.0],
            &["time", "lat", "lon"],
            &two_days(),
        );

        let snapshot = NetCdfReader::default().open(&path).unwrap();

        assert_eq!(snapshot.date(), NaiveDate::from_ymd_opt(2023, 7, 1));
        assert_eq!(snapshot.lat_axis().values(), &[10.0, 20.0]);
        assert_eq!(snapshot.lon_axis().values(), &[100.0, 110.0, 120.0]);
        assert_eq!(snapshot.value_at(0, 0), Some(290.0));
        assert_eq!(snapshot.value_at(0, 2), Some(292.0));
        assert_eq!(snapshot.value_at(1, 1), Some(295.0));
        assert_eq!(snapshot.value_at(1, 2), Some(300.0));
    }

    #[test]
    fn test_fill_and_missing_cells_are_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            dir.path(),
            "t2m_20230702.nc",
            &[10.0, 20.0],
            &["time", "lat", "lon"],
            &two_days(),
        );

        let snapshot = NetCdfReader::default().open(&path).unwrap();

        assert!(snapshot.value_at(0, 1).is_some_and(f64::is_nan));
        assert!(snapshot.value_at(1, 0).is_some_and(f64::is_nan));
    }

    #[test]
    fn test_missing_field_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            dir.path(),
            "t2m_20230701.nc",
            &[10.0, 20.0],
            &["time", "lat", "lon"],
            &two_days(),
        );
        let reader = NetCdfReader::builder().field_variable("nope").build();

        let reason = reason_of(reader.open(&path).unwrap_err(), &path);
        assert!(reason.contains("nope"));
    }

    #[test]
    fn test_mismatched_shape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let transposed = write_grid(
            dir.path(),
            "t2m_20230701.nc",
            &[10.0, 20.0],
            &["time", "lon", "lat"],
            &two_days(),
        );
        let reason = reason_of(
            NetCdfReader::default().open(&transposed).unwrap_err(),
            &transposed,
        );
        assert!(reason.contains("shaped"));

        let flat = write_grid(
            dir.path(),
            "t2m_20230702.nc",
            &[10.0, 20.0],
            &["lon"],
            &[80.0, 82.0, 84.0],
        );
        let reason = reason_of(NetCdfReader::default().open(&flat).unwrap_err(), &flat);
        assert!(reason.contains("1 dimensions"));
    }

    #[test]
    fn test_bad_axis_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_grid(
            dir.path(),
            "t2m_20230701.nc",
            &[10.0, 30.0, 20.0],
            &["lat", "lon"],
            &[80.0; 9],
        );

        let reason = reason_of(NetCdfReader::default().open(&path).unwrap_err(), &path);
        assert!(reason.contains("'lat'"));
        assert!(reason.contains("not monotonic"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t2m_20230701.nc");
        reason_of(NetCdfReader::default().open(&path).unwrap_err(), &path);
    }
}
