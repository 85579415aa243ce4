use crate::grid::axis::GridAxis;
use crate::grid::error::GridError;
use chrono::NaiveDate;

/// One day of a gridded scalar field in the source unit (kelvin for temperature).
///
/// Values are stored row-major: `values[lat_index * lon_len + lon_index]`.
/// Cells without data hold `NaN`.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    date: Option<NaiveDate>,
    lat_axis: GridAxis,
    lon_axis: GridAxis,
    values: Vec<f64>,
}

impl GridSnapshot {
    pub fn new(
        date: Option<NaiveDate>,
        lat_axis: GridAxis,
        lon_axis: GridAxis,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let expected = lat_axis.len() * lon_axis.len();
        if values.len() != expected {
            return Err(GridError::invalid(format!(
                "field has {} values, axes describe {} x {} = {}",
                values.len(),
                lat_axis.len(),
                lon_axis.len(),
                expected
            )));
        }
        Ok(Self {
            date,
            lat_axis,
            lon_axis,
            values,
        })
    }

    /// Builds a snapshot from nested rows, one row per latitude.
    pub fn from_rows(
        date: Option<NaiveDate>,
        lat_axis: Vec<f64>,
        lon_axis: Vec<f64>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, GridError> {
        let lon_len = lon_axis.len();
        if let Some(row) = rows.iter().position(|r| r.len() != lon_len) {
            return Err(GridError::invalid(format!(
                "row {} has {} values, expected {}",
                row,
                rows[row].len(),
                lon_len
            )));
        }
        Self::new(
            date,
            GridAxis::new(lat_axis)?,
            GridAxis::new(lon_axis)?,
            rows.into_iter().flatten().collect(),
        )
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn lat_axis(&self) -> &GridAxis {
        &self.lat_axis
    }

    pub fn lon_axis(&self) -> &GridAxis {
        &self.lon_axis
    }

    /// Raw value of a cell, `None` when the indices are out of bounds.
    pub fn value_at(&self, lat_index: usize, lon_index: usize) -> Option<f64> {
        if lat_index >= self.lat_axis.len() || lon_index >= self.lon_axis.len() {
            return None;
        }
        self.values
            .get(lat_index * self.lon_axis.len() + lon_index)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_at_is_row_major() {
        let snapshot = GridSnapshot::from_rows(
            None,
            vec![10.0, 20.0],
            vec![100.0, 110.0, 120.0],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        assert_eq!(snapshot.value_at(0, 2), Some(3.0));
        assert_eq!(snapshot.value_at(1, 0), Some(4.0));
        assert_eq!(snapshot.value_at(2, 0), None);
        assert_eq!(snapshot.value_at(0, 3), None);
    }

    #[test]
    fn test_field_shape_must_match_axes() {
        let result = GridSnapshot::from_rows(
            None,
            vec![10.0, 20.0],
            vec![100.0, 110.0],
            vec![vec![1.0, 2.0], vec![3.0]],
        );
        assert!(matches!(result, Err(GridError::InvalidGrid { .. })));
    }
}
