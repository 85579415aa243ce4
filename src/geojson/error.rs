use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("Failed to read GeoJSON file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write GeoJSON file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse GeoJSON")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to serialize GeoJSON")]
    Serialize(#[source] serde_json::Error),

    #[error("Expected a FeatureCollection, found type '{0}'")]
    NotAFeatureCollection(String),

    #[error("Feature at index {index} has no string 'name' property")]
    MissingName { index: usize },

    #[error("Feature '{name}' has no geometry")]
    MissingGeometry { name: String },

    #[error("Feature '{name}' has an empty or degenerate geometry without a centroid")]
    EmptyGeometry { name: String },
}
