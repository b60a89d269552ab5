//! Progress inspection of a dataset file.

use std::path::Path;

use station_geocoder_models::FileStatus;

use crate::DatasetError;
use crate::dataset::{open_reader, read_headers};

/// Summarizes geocoding progress in the CSV at `path`.
///
/// Works on raw cells, so files without the source columns can still be
/// inspected. A file lacking `latitude`/`longitude` reports every row as
/// pending.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] if the file is missing or
/// [`DatasetError::Read`] if it is not valid CSV.
pub fn inspect(path: &Path) -> Result<FileStatus, DatasetError> {
    let mut reader = open_reader(path)?;
    let headers = read_headers(&mut reader, path)?;

    let position = |name: &str| headers.iter().position(|h| h == name);
    let latitude = position("latitude");
    let longitude = position("longitude");
    let status = position("geocoding_status");

    let mut total = 0u64;
    let mut completed = 0u64;
    let mut errored = 0u64;

    for result in reader.records() {
        let row = result.map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        total += 1;

        let filled = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .is_some_and(|v| !v.trim().is_empty())
        };

        if filled(latitude) && filled(longitude) {
            completed += 1;
        }
        if status.and_then(|i| row.get(i)) == Some("ERROR") {
            errored += 1;
        }
    }

    let has_geocoding = latitude.is_some() && longitude.is_some();
    if !has_geocoding {
        return Ok(FileStatus {
            total,
            completed: 0,
            errored: 0,
            pending: total,
            has_geocoding,
        });
    }

    Ok(FileStatus {
        total,
        completed,
        errored,
        pending: total.saturating_sub(completed + errored),
        has_geocoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("station_geocoder_status_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stations.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn file_without_coordinate_columns_is_all_pending() {
        let path = write_fixture("no_geo", "location,subdistrict\na,b\nc,d\ne,f\n");

        let status = inspect(&path).unwrap();
        assert!(!status.has_geocoding);
        assert_eq!(status.total, 3);
        assert_eq!(status.pending, status.total);
        assert!(status.completion_rate().abs() < f64::EPSILON);
        assert!(!status.is_complete());

        cleanup(&path);
    }

    #[test]
    fn counts_completed_errored_and_pending() {
        let path = write_fixture(
            "mixed",
            "location,subdistrict,latitude,longitude,geocoding_status\n\
             a,b,13.7,100.5,OK\n\
             c,d,,,ERROR\n\
             e,f,,,ZERO_RESULTS\n\
             g,h,,,\n",
        );

        let status = inspect(&path).unwrap();
        assert!(status.has_geocoding);
        assert_eq!(status.total, 4);
        assert_eq!(status.completed, 1);
        assert_eq!(status.errored, 1);
        assert_eq!(status.pending, 2);
        assert!((status.completion_rate() - 0.25).abs() < 1e-9);

        cleanup(&path);
    }

    #[test]
    fn fully_geocoded_file_is_complete() {
        let path = write_fixture(
            "complete",
            "location,subdistrict,latitude,longitude,geocoding_status\na,b,13.7,100.5,OK\n",
        );

        assert!(inspect(&path).unwrap().is_complete());

        cleanup(&path);
    }

    #[test]
    fn empty_file_has_zero_rate() {
        let path = write_fixture("empty", "location,subdistrict,latitude,longitude\n");

        let status = inspect(&path).unwrap();
        assert_eq!(status.total, 0);
        assert!(status.completion_rate().abs() < f64::EPSILON);

        cleanup(&path);
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("station_geocoder_status_absent.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(inspect(&path), Err(DatasetError::NotFound { .. })));
    }
}
