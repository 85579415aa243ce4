use crate::types::month::Month;
use thiserror::Error;

/// Failure of a whole month. Single unreadable files are not errors; they are
/// skipped and counted in [`crate::MonthlyAverages::files_skipped`].
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("No grid files were given for {month}")]
    NoFiles { month: Month },

    #[error("All {attempted} grid files for {month} were unreadable")]
    AllFilesUnreadable { month: Month, attempted: usize },
}
