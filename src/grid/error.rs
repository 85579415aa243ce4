use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid grid axis: {reason}")]
    InvalidGrid { reason: String },

    #[error("Unreadable grid file '{path}': {reason}")]
    UnreadableGrid { path: PathBuf, reason: String },
}

impl GridError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GridError::InvalidGrid {
            reason: reason.into(),
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        GridError::UnreadableGrid {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
