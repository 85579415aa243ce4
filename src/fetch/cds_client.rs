//! [`GridFetcher`] backed by the Copernicus Climate Data Store retrieve API.

use crate::fetch::credentials::CdsCredentials;
use crate::fetch::error::FetchError;
use crate::fetch::fetcher::{FetchRequest, GridFetcher};
use async_compression::tokio::bufread::GzipDecoder;
use bon::bon;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::BufWriter;
use tokio_util::io::StreamReader;

pub const DATASET: &str = "sis-agrometeorological-indicators";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Deserialize)]
struct JobStatus {
    #[serde(rename = "jobID")]
    job_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobResults {
    asset: ResultAsset,
}

#[derive(Debug, Deserialize)]
struct ResultAsset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
}

#[derive(Debug, Clone)]
pub struct CdsClient {
    http: Client,
    credentials: CdsCredentials,
    poll_interval: Duration,
    max_wait: Duration,
}

#[bon]
impl CdsClient {
    /// Credentials default to [`CdsCredentials::discover`]. Jobs are polled
    /// every 5 s and abandoned after 2 h unless configured otherwise.
    #[builder]
    pub fn new(
        credentials: Option<CdsCredentials>,
        poll_interval: Option<Duration>,
        max_wait: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let credentials = match credentials {
            Some(c) => c,
            None => CdsCredentials::discover()?,
        };
        Ok(Self {
            http: Client::new(),
            credentials,
            poll_interval: poll_interval.unwrap_or(Duration::from_secs(5)),
            max_wait: max_wait.unwrap_or(Duration::from_secs(2 * 60 * 60)),
        })
    }
}

impl CdsClient {
    /// Request inputs for one month of daily mean 2 m air temperature.
    pub fn request_inputs(request: &FetchRequest) -> Value {
        let days: Vec<String> = request.days.iter().map(|d| format!("{:02}", d)).collect();
        json!({
            "inputs": {
                "variable": "2m_temperature",
                "statistic": ["24_hour_mean"],
                "year": [request.month.year().to_string()],
                "month": [format!("{:02}", request.month.month())],
                "day": days,
                "area": request.area,
                "format": "tgz",
            }
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(TOKEN_HEADER, &self.credentials.key)
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> Result<Response, FetchError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => FetchError::NetworkRequest(url.to_string(), e),
                })
            }
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(
        url: &str,
        response: Response,
    ) -> Result<T, FetchError> {
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        serde_json::from_str(&body).map_err(|e| FetchError::UnexpectedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn submit(&self, request: &FetchRequest) -> Result<JobStatus, FetchError> {
        let url = format!(
            "{}/retrieve/v1/processes/{}/execution",
            self.credentials.url, DATASET
        );
        let body = Self::request_inputs(request);
        debug!("Submitting {} request for {}: {}", DATASET, request.month, body);
        let response = self.send(&url, self.http.post(&url).json(&body)).await?;
        Self::json(&url, response).await
    }

    async fn wait_for(&self, mut job: JobStatus) -> Result<JobStatus, FetchError> {
        let url = format!("{}/retrieve/v1/jobs/{}", self.credentials.url, job.job_id);
        let started = Instant::now();
        loop {
            match job.status.as_str() {
                "successful" => return Ok(job),
                "failed" | "rejected" | "dismissed" | "deleted" => {
                    return Err(FetchError::JobFailed {
                        job_id: job.job_id,
                        status: job.status,
                    })
                }
                _ => {}
            }
            let waited = started.elapsed();
            if waited >= self.max_wait {
                return Err(FetchError::Timeout {
                    job_id: job.job_id,
                    waited,
                });
            }
            debug!("Job {} is '{}', polling again", job.job_id, job.status);
            tokio::time::sleep(self.poll_interval).await;
            let response = self.send(&url, self.http.get(&url)).await?;
            job = Self::json(&url, response).await?;
        }
    }

    async fn result_href(&self, job: &JobStatus) -> Result<String, FetchError> {
        let url = format!(
            "{}/retrieve/v1/jobs/{}/results",
            self.credentials.url, job.job_id
        );
        let response = self.send(&url, self.http.get(&url)).await?;
        let results: JobResults = Self::json(&url, response).await?;
        Ok(results.asset.value.href)
    }

    /// Streams the gzipped result through a decoder straight into `target`.
    async fn download(&self, href: &str, target: &Path) -> Result<u64, FetchError> {
        info!("Downloading {} to {}", href, target.display());
        let response = self.send(href, self.http.get(href)).await?;
        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut decoder = GzipDecoder::new(StreamReader::new(stream));

        let file = tokio::fs::File::create(target)
            .await
            .map_err(|e| FetchError::DownloadIo(target.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);
        let written = tokio::io::copy(&mut decoder, &mut writer)
            .await
            .map_err(|e| FetchError::DownloadIo(target.to_path_buf(), e))?;
        tokio::io::AsyncWriteExt::flush(&mut writer)
            .await
            .map_err(|e| FetchError::DownloadIo(target.to_path_buf(), e))?;
        Ok(written)
    }
}

impl GridFetcher for CdsClient {
    async fn fetch(&self, request: &FetchRequest, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let job = self.submit(request).await?;
        info!("Submitted job {} for {}", job.job_id, request.month);
        let job = self.wait_for(job).await?;
        let href = self.result_href(&job).await?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| FetchError::DownloadIo(dest_dir.to_path_buf(), e))?;
        let target = dest_dir.join(format!("{}.tar", request.month.compact()));
        let bytes = self.download(&href, &target).await?;
        info!(
            "Stored {} bytes for {} at {}",
            bytes,
            request.month,
            target.display()
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::bbox::RequestArea;
    use crate::types::month::Month;

    #[test]
    fn test_request_inputs() {
        let request = FetchRequest {
            area: RequestArea {
                north: 53,
                west: 4,
                south: 51,
                east: 7,
            },
            month: Month(2023, 2),
            days: vec![1, 2, 28],
        };
        let body = CdsClient::request_inputs(&request);
        let inputs = &body["inputs"];
        assert_eq!(inputs["year"], json!(["2023"]));
        assert_eq!(inputs["month"], json!(["02"]));
        assert_eq!(inputs["day"], json!(["01", "02", "28"]));
        assert_eq!(inputs["area"], json!([53, 4, 51, 7]));
        assert_eq!(inputs["format"], json!("tgz"));
    }

    #[test]
    fn test_builder_with_explicit_credentials() {
        let client = CdsClient::builder()
            .credentials(CdsCredentials::new("https://example.org/api/", "k"))
            .poll_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        assert_eq!(client.credentials.url, "https://example.org/api");
        assert_eq!(client.poll_interval, Duration::from_millis(10));
        assert_eq!(client.max_wait, Duration::from_secs(7200));
    }

    #[test]
    fn test_job_status_parsing() {
        let status: JobStatus =
            serde_json::from_str(r#"{"jobID": "abc", "status": "accepted", "type": "process"}"#)
                .unwrap();
        assert_eq!(status.job_id, "abc");
        let results: JobResults = serde_json::from_str(
            r#"{"asset": {"value": {"href": "https://example.org/a.tar.gz", "file:size": 10}}}"#,
        )
        .unwrap();
        assert_eq!(results.asset.value.href, "https://example.org/a.tar.gz");
    }
}
