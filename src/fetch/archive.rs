//! Unpacking downloaded archives and finding daily grid files on disk.

use crate::fetch::error::FetchError;
use crate::types::month::{date_from_file_name, Month};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::task;

fn file_name_key(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn unpack(tar_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let archive_err = |e| FetchError::Archive(tar_path.to_path_buf(), e);
    std::fs::create_dir_all(dest_dir).map_err(archive_err)?;

    let file = std::fs::File::open(tar_path).map_err(archive_err)?;
    let mut archive = tar::Archive::new(file);
    let mut extracted = Vec::new();
    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let relative = entry.path().map_err(archive_err)?.into_owned();
        // unpack_in refuses entries escaping dest_dir and returns false for them
        if entry.unpack_in(dest_dir).map_err(archive_err)? {
            extracted.push(dest_dir.join(relative));
        } else {
            debug!("Skipped archive entry outside target: {}", relative.display());
        }
    }
    std::fs::remove_file(tar_path).map_err(archive_err)?;

    extracted.sort_by(|a, b| file_name_key(a).cmp(&file_name_key(b)));
    Ok(extracted)
}

/// Unpacks `tar_path` into `dest_dir`, deletes the archive and returns the
/// extracted files sorted by file name.
pub async fn extract_archive(tar_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let tar_owned = tar_path.to_path_buf();
    let dest_owned = dest_dir.to_path_buf();
    let files = task::spawn_blocking(move || unpack(&tar_owned, &dest_owned)).await??;
    info!(
        "Extracted {} files from {} into {}",
        files.len(),
        tar_path.display(),
        dest_dir.display()
    );
    Ok(files)
}

/// Groups every file under `root` by the month of the date in its name.
/// Files without a date token are ignored; each month's list is sorted by file name.
pub fn discover_grid_files(root: &Path) -> Result<BTreeMap<Month, Vec<PathBuf>>, FetchError> {
    let mut by_month: BTreeMap<Month, Vec<PathBuf>> = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| FetchError::ListDirectory(root.to_path_buf(), e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(date) = file_name_key(entry.path()).and_then(date_from_file_name) else {
            continue;
        };
        by_month
            .entry(Month::of(date))
            .or_default()
            .push(entry.into_path());
    }
    for files in by_month.values_mut() {
        files.sort_by(|a, b| file_name_key(a).cmp(&file_name_key(b)));
    }
    Ok(by_month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tar(path: &Path, names: &[&str]) {
        let file = std::fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for name in names {
            let data = name.as_bytes();
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data).unwrap();
        }
        builder.finish().unwrap();
    }

    #[tokio::test]
    async fn test_extract_sorts_and_removes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let tar_path = dir.path().join("202301.tar");
        write_tar(
            &tar_path,
            &[
                "Temperature-Air-2m-Mean-24h_C3S-glob-agric_AgERA5_20230102_final-v1.1.nc",
                "Temperature-Air-2m-Mean-24h_C3S-glob-agric_AgERA5_20230101_final-v1.1.nc",
            ],
        );
        let dest = dir.path().join("202301");

        let files = extract_archive(&tar_path, &dest).await.unwrap();

        assert!(!tar_path.exists());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.exists() && f.starts_with(&dest)));
        let names: Vec<&str> = files.iter().filter_map(|f| file_name_key(f)).collect();
        assert!(names[0].contains("20230101"));
        assert!(names[1].contains("20230102"));
    }

    #[tokio::test]
    async fn test_missing_archive_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.tar");
        let err = extract_archive(&missing, dir.path()).await.unwrap_err();
        assert!(matches!(err, FetchError::Archive(path, _) if path == missing));
    }

    #[test]
    fn test_discover_groups_by_month() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("202302");
        std::fs::create_dir_all(&nested).unwrap();
        for name in ["t_20230131.nc", "t_20230101.nc", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::write(nested.join("t_20230215.nc"), b"").unwrap();

        let grouped = discover_grid_files(dir.path()).unwrap();

        assert_eq!(
            grouped.keys().copied().collect::<Vec<_>>(),
            vec![Month(2023, 1), Month(2023, 2)]
        );
        let january: Vec<&str> = grouped[&Month(2023, 1)]
            .iter()
            .filter_map(|f| file_name_key(f))
            .collect();
        assert_eq!(january, vec!["t_20230101.nc", "t_20230131.nc"]);
        assert_eq!(grouped[&Month(2023, 2)].len(), 1);
    }
}
