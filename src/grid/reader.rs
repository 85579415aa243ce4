use crate::grid::error::GridError;
use crate::grid::snapshot::GridSnapshot;
use std::path::Path;

/// Opens one daily grid file.
///
/// Implementations fail with [`GridError::UnreadableGrid`] when the file cannot
/// be parsed or lacks the latitude, longitude or scalar-field variables. Values
/// are returned in the source unit; unit conversion belongs to the aggregator.
pub trait GridReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<GridSnapshot, GridError>;
}
