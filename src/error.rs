use crate::aggregate::error::AggregateError;
use crate::fetch::error::FetchError;
use crate::geojson::error::GeoJsonError;
use crate::grid::error::GridError;
use crate::registry::error::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoTempError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    GeoJson(#[from] GeoJsonError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to create work directory '{0}'")]
    WorkDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Work directory path '{0}' exists but is not a directory")]
    WorkDirNotADirectory(PathBuf),

    #[error("Failed to determine the system cache directory")]
    CacheDirResolution,

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
