use crate::grid::error::GridError;
use crate::grid::reader::GridReader;
use crate::grid::snapshot::GridSnapshot;
use std::collections::HashMap;
use std::path::Path;

/// A [`GridReader`] over snapshots that are already decoded, keyed by file name.
///
/// Paths are matched on their final component only, so the same reader serves
/// files wherever an archive was extracted. Unknown names are unreadable.
#[derive(Debug, Clone, Default)]
pub struct MemoryGridReader {
    snapshots: HashMap<String, GridSnapshot>,
}

impl MemoryGridReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: impl Into<String>, snapshot: GridSnapshot) {
        self.snapshots.insert(file_name.into(), snapshot);
    }

    pub fn with(mut self, file_name: impl Into<String>, snapshot: GridSnapshot) -> Self {
        self.insert(file_name, snapshot);
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl GridReader for MemoryGridReader {
    fn open(&self, path: &Path) -> Result<GridSnapshot, GridError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GridError::unreadable(path, "path has no file name"))?;
        self.snapshots
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::unreadable(path, "no snapshot registered for this file"))
    }
}
