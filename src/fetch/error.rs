use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No usable CDS credentials: {0}")]
    Credentials(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Retrieval job {job_id} ended with status '{status}'")]
    JobFailed { job_id: String, status: String },

    #[error("Retrieval job {job_id} did not finish within {waited:?}")]
    Timeout { job_id: String, waited: Duration },

    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedResponse { url: String, reason: String },

    #[error("Download or decompression into '{0}' failed")]
    DownloadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to unpack archive '{0}'")]
    Archive(PathBuf, #[source] std::io::Error),

    #[error("Failed to list grid files under '{0}'")]
    ListDirectory(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}
