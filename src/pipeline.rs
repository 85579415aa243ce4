//! Month-by-month orchestration: fetch, extract, aggregate and record.

use crate::aggregate::aggregator::{aggregate_month, MonthlyAverages};
use crate::error::GeoTempError;
use crate::fetch::archive::extract_archive;
use crate::fetch::error::FetchError;
use crate::fetch::fetcher::{FetchRequest, GridFetcher};
use crate::geojson::collection::FeatureCollection;
use crate::geojson::export::merge_results;
use crate::grid::reader::GridReader;
use crate::registry::feature_registry::FeatureRegistry;
use crate::types::bbox::RequestArea;
use crate::types::feature::Feature;
use crate::types::month::{days_by_month, Month};
use crate::utils::{ensure_dir_exists, get_cache_dir};
use bon::bon;
use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// A month that was aggregated and recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub month: Month,
    pub files_read: usize,
    pub files_skipped: usize,
    /// Features that received a value for this month.
    pub features_recorded: usize,
    pub elapsed: Duration,
}

/// A month that produced no column, with the reason.
#[derive(Debug)]
pub struct MonthFailure {
    pub month: Month,
    pub error: GeoTempError,
}

/// Outcome of a run, both lists in month order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<MonthSummary>,
    pub failed: Vec<MonthFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_months(&self) -> Vec<Month> {
        self.failed.iter().map(|f| f.month).collect()
    }
}

type MonthOutcome = (Month, Result<MonthlyAverages, GeoTempError>, Duration);

/// Computes monthly mean temperatures for a fixed set of features.
///
/// Months are processed concurrently, at most `concurrency` at a time, and each
/// month's aggregation runs on a blocking thread with its own accumulator.
/// Results are written to the registry only after every month has finished,
/// so a failing month never affects the others.
///
/// # Examples
///
/// ```rust,ignore
/// # use geotemp::{CdsClient, FeatureCollection, FeatureRegistry, GeoTempError, NetCdfReader, TemperaturePipeline};
/// # use chrono::NaiveDate;
/// # use std::path::Path;
/// # async fn run() -> Result<(), GeoTempError> {
/// let collection = FeatureCollection::from_path(Path::new("fields.geojson"))?;
/// let area = collection.total_bounds().expect("non-empty collection").request_area();
/// let registry = FeatureRegistry::load(collection.to_features()?)?;
///
/// let mut pipeline = TemperaturePipeline::builder()
///     .registry(registry)
///     .reader(NetCdfReader::default())
///     .build()?;
/// let client = CdsClient::builder().build()?;
/// let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
/// let report = pipeline.run(&client, area, start, end).await?;
/// println!("{} months done, {} failed", report.completed.len(), report.failed.len());
/// pipeline.write_geojson(&collection, Path::new("result.geojson"))?;
/// # Ok(())
/// # }
/// ```
pub struct TemperaturePipeline<R: GridReader + 'static> {
    registry: FeatureRegistry,
    reader: Arc<R>,
    work_dir: PathBuf,
    concurrency: usize,
}

#[bon]
impl<R: GridReader + 'static> TemperaturePipeline<R> {
    /// `work_dir` defaults to `geotemp_cache` under the system cache directory
    /// and `concurrency` to [`DEFAULT_CONCURRENCY`]. The directory is created
    /// on the first run.
    ///
    /// # Errors
    ///
    /// Returns [`GeoTempError::CacheDirResolution`] if no `work_dir` is given
    /// and the system cache directory cannot be determined.
    #[builder]
    pub fn new(
        registry: FeatureRegistry,
        reader: R,
        work_dir: Option<PathBuf>,
        concurrency: Option<usize>,
    ) -> Result<Self, GeoTempError> {
        let work_dir = match work_dir {
            Some(dir) => dir,
            None => get_cache_dir()?,
        };
        Ok(Self {
            registry,
            reader: Arc::new(reader),
            work_dir,
            concurrency: concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
        })
    }
}

impl<R: GridReader + 'static> TemperaturePipeline<R> {
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Fetches, extracts and aggregates every month touched by `start..=end`,
    /// requesting only the days inside the range.
    ///
    /// Per-month failures end up in [`RunReport::failed`]. The call itself
    /// fails only for an inverted date range or an unusable work directory.
    pub async fn run<F: GridFetcher>(
        &mut self,
        fetcher: &F,
        area: RequestArea,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunReport, GeoTempError> {
        let months =
            days_by_month(start, end).ok_or(FetchError::InvalidDateRange { start, end })?;
        ensure_dir_exists(&self.work_dir).await?;
        info!(
            "Processing {} months from {} to {} for {} features",
            months.len(),
            start,
            end,
            self.registry.len()
        );

        let features = Arc::new(self.registry.features().to_vec());
        let reader = &self.reader;
        let work_dir = &self.work_dir;
        let outcomes: Vec<MonthOutcome> = stream::iter(months)
            .map(|(month, days)| {
                let request = FetchRequest { area, month, days };
                let reader = Arc::clone(reader);
                let features = Arc::clone(&features);
                async move {
                    let started = Instant::now();
                    let result =
                        Self::fetch_and_aggregate(fetcher, &request, work_dir, reader, features)
                            .await;
                    (request.month, result, started.elapsed())
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        self.record(outcomes)
    }

    /// Aggregates files already on disk, e.g. grouped by
    /// [`crate::fetch::archive::discover_grid_files`].
    pub async fn aggregate_local(
        &mut self,
        files_by_month: BTreeMap<Month, Vec<PathBuf>>,
    ) -> Result<RunReport, GeoTempError> {
        let features = Arc::new(self.registry.features().to_vec());
        let reader = &self.reader;
        let outcomes: Vec<MonthOutcome> = stream::iter(files_by_month)
            .map(|(month, files)| {
                let reader = Arc::clone(reader);
                let features = Arc::clone(&features);
                async move {
                    let started = Instant::now();
                    let result = Self::aggregate_blocking(reader, features, month, files).await;
                    (month, result, started.elapsed())
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        self.record(outcomes)
    }

    /// Joins the current results onto `collection` and writes it to `path`.
    pub fn write_geojson(
        &self,
        collection: &FeatureCollection,
        path: &Path,
    ) -> Result<FeatureCollection, GeoTempError> {
        let merged = merge_results(collection, self.registry.export_table());
        merged.write_to_path(path)?;
        info!("Wrote {} features to {}", merged.features.len(), path.display());
        Ok(merged)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), GeoTempError> {
        self.registry.export_table().write_csv(path)?;
        Ok(())
    }

    async fn fetch_and_aggregate<F: GridFetcher>(
        fetcher: &F,
        request: &FetchRequest,
        work_dir: &Path,
        reader: Arc<R>,
        features: Arc<Vec<Feature>>,
    ) -> Result<MonthlyAverages, GeoTempError> {
        let archive = fetcher.fetch(request, work_dir).await?;
        let extract_dir = work_dir.join(request.month.compact());
        let files = extract_archive(&archive, &extract_dir).await?;
        Self::aggregate_blocking(reader, features, request.month, files).await
    }

    async fn aggregate_blocking(
        reader: Arc<R>,
        features: Arc<Vec<Feature>>,
        month: Month,
        files: Vec<PathBuf>,
    ) -> Result<MonthlyAverages, GeoTempError> {
        let averages = task::spawn_blocking(move || {
            aggregate_month(reader.as_ref(), month, &files, features.as_slice())
        })
        .await??;
        Ok(averages)
    }

    fn record(&mut self, mut outcomes: Vec<MonthOutcome>) -> Result<RunReport, GeoTempError> {
        outcomes.sort_by_key(|(month, ..)| *month);
        let mut report = RunReport::default();
        for (month, result, elapsed) in outcomes {
            match result {
                Ok(averages) => {
                    let features_recorded = self.registry.record_month(&averages)?;
                    report.completed.push(MonthSummary {
                        month,
                        files_read: averages.files_read(),
                        files_skipped: averages.files_skipped(),
                        features_recorded,
                        elapsed,
                    });
                }
                Err(error) => {
                    warn!("Month {} failed: {}", month, error);
                    report.failed.push(MonthFailure { month, error });
                }
            }
        }
        info!(
            "Run finished: {} months recorded, {} failed",
            report.completed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
