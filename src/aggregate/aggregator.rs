//! Folds daily grid snapshots into one monthly mean per feature.

use crate::aggregate::error::AggregateError;
use crate::grid::reader::GridReader;
use crate::grid::resolver::AssignmentCache;
use crate::types::feature::Feature;
use crate::types::month::Month;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Subtracted from kelvin source values to get degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Mean temperature of one feature over the days that had data.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAverage {
    pub name: String,
    pub celsius: f64,
    pub days: u32,
}

/// Result of aggregating one month.
///
/// Features without a single usable day are absent from [`Self::averages`];
/// they never appear with `NaN` or `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAverages {
    month: Month,
    averages: Vec<FeatureAverage>,
    files_read: usize,
    files_skipped: usize,
}

impl MonthlyAverages {
    pub fn month(&self) -> Month {
        self.month
    }

    /// Averages in feature order.
    pub fn averages(&self) -> &[FeatureAverage] {
        &self.averages
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.averages
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.celsius)
    }

    pub fn files_read(&self) -> usize {
        self.files_read
    }

    pub fn files_skipped(&self) -> usize {
        self.files_skipped
    }
}

/// Running sum and day count per feature, indexed like the feature slice.
#[derive(Debug)]
struct MonthAccumulator {
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl MonthAccumulator {
    fn new(features: usize) -> Self {
        Self {
            sums: vec![0.0; features],
            counts: vec![0; features],
        }
    }

    fn add(&mut self, feature: usize, value: f64) {
        self.sums[feature] += value;
        self.counts[feature] += 1;
    }

    fn mean(&self, feature: usize) -> Option<(f64, u32)> {
        match self.counts[feature] {
            0 => None,
            n => Some((self.sums[feature] / n as f64, n)),
        }
    }
}

/// Aggregates months of daily files for a fixed feature list.
///
/// Nearest-cell assignments are memoised per grid layout for the lifetime of
/// the aggregator, which is sound because the feature list cannot change.
pub struct MonthlyAggregator<'a, R: GridReader + ?Sized> {
    reader: &'a R,
    features: &'a [Feature],
    cache: AssignmentCache,
}

impl<'a, R: GridReader + ?Sized> MonthlyAggregator<'a, R> {
    pub fn new(reader: &'a R, features: &'a [Feature]) -> Self {
        Self {
            reader,
            features,
            cache: AssignmentCache::new(),
        }
    }

    /// Averages the Celsius values of every feature's nearest cell over `files`.
    ///
    /// Unreadable files, files with unusable axes and files dated outside
    /// `month` are logged and skipped. The month fails only when there is
    /// nothing to read or nothing could be read.
    pub fn aggregate(
        &mut self,
        month: Month,
        files: &[PathBuf],
    ) -> Result<MonthlyAverages, AggregateError> {
        if files.is_empty() {
            return Err(AggregateError::NoFiles { month });
        }
        let started = Instant::now();
        let mut accumulator = MonthAccumulator::new(self.features.len());
        let mut files_read = 0;
        let mut files_skipped = 0;

        for path in files {
            let snapshot = match self.reader.open(path) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Skipping grid file for {}: {}", month, e);
                    files_skipped += 1;
                    continue;
                }
            };
            if let Some(date) = snapshot.date() {
                if !month.contains(date) {
                    warn!(
                        "Skipping {}: dated {} which is outside {}",
                        path.display(),
                        date,
                        month
                    );
                    files_skipped += 1;
                    continue;
                }
            }
            let assignments = match self.cache.assignments(&snapshot, self.features) {
                Ok(assignments) => assignments,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    files_skipped += 1;
                    continue;
                }
            };
            for (feature, assignment) in assignments.iter().enumerate() {
                let raw = snapshot.value_at(assignment.cell.lat_index, assignment.cell.lon_index);
                if let Some(kelvin) = raw.filter(|v| v.is_finite()) {
                    accumulator.add(feature, kelvin - KELVIN_OFFSET);
                }
            }
            files_read += 1;
        }

        if files_read == 0 {
            return Err(AggregateError::AllFilesUnreadable {
                month,
                attempted: files.len(),
            });
        }

        let averages: Vec<FeatureAverage> = self
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                accumulator.mean(i).map(|(celsius, days)| FeatureAverage {
                    name: feature.name().to_string(),
                    celsius,
                    days,
                })
            })
            .collect();

        info!(
            "Aggregated {}: {} files read, {} skipped, {}/{} features with data in {:?}",
            month,
            files_read,
            files_skipped,
            averages.len(),
            self.features.len(),
            started.elapsed()
        );

        Ok(MonthlyAverages {
            month,
            averages,
            files_read,
            files_skipped,
        })
    }
}

/// One-shot form of [`MonthlyAggregator::aggregate`].
pub fn aggregate_month<R: GridReader + ?Sized>(
    reader: &R,
    month: Month,
    files: &[PathBuf],
    features: &[Feature],
) -> Result<MonthlyAverages, AggregateError> {
    MonthlyAggregator::new(reader, features).aggregate(month, files)
}
