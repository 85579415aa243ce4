use crate::grid::error::GridError;

/// Coordinate values (degrees) along one dimension of a grid.
///
/// Values are finite and monotonic, either increasing or decreasing, but need
/// not be evenly spaced. Reanalysis products commonly store latitude from north
/// to south, so both directions are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Vec<f64>,
}

impl GridAxis {
    pub fn new(values: Vec<f64>) -> Result<Self, GridError> {
        if values.is_empty() {
            return Err(GridError::invalid("axis is empty"));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(GridError::invalid(format!(
                "axis value at index {} is not finite",
                i
            )));
        }
        let increasing = values.windows(2).all(|w| w[0] <= w[1]);
        let decreasing = values.windows(2).all(|w| w[0] >= w[1]);
        if !increasing && !decreasing {
            return Err(GridError::invalid("axis is not monotonic"));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

impl TryFrom<Vec<f64>> for GridAxis {
    type Error = GridError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        GridAxis::new(values)
    }
}
