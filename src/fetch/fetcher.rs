use crate::fetch::error::FetchError;
use crate::types::bbox::RequestArea;
use crate::types::month::Month;
use std::future::Future;
use std::path::{Path, PathBuf};

/// One month of daily grids to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub area: RequestArea,
    pub month: Month,
    /// Day-of-month numbers, ascending.
    pub days: Vec<u32>,
}

/// Source of daily grid archives.
///
/// `fetch` stores one tar archive for the request under `dest_dir` and returns
/// its path. Unpacking is left to [`crate::fetch::archive::extract_archive`].
pub trait GridFetcher: Send + Sync {
    fn fetch(
        &self,
        request: &FetchRequest,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, FetchError>> + Send;
}
