use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("Feature name '{0}' occurs more than once")]
    DuplicateFeature(String),

    #[error("Feature '{name}' has a non-finite centroid ({lat}, {lon})")]
    NonFiniteCentroid { name: String, lat: f64, lon: f64 },

    #[error("Failed building result DataFrame")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to create CSV file '{0}'")]
    CsvCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed writing CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),
}
