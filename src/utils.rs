use crate::error::GeoTempError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "geotemp_cache";

pub fn get_cache_dir() -> Result<PathBuf, GeoTempError> {
    dirs::cache_dir()
        .map(|p| p.join(CACHE_DIR_NAME))
        .ok_or(GeoTempError::CacheDirResolution)
}

pub async fn ensure_dir_exists(path: &Path) -> Result<(), GeoTempError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(GeoTempError::WorkDirNotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating work directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| GeoTempError::WorkDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(GeoTempError::WorkDirCreation(path.to_path_buf(), e)),
    }
}
