//! Durable progress snapshots.
//!
//! Mid-run saves only ever touch `<destination>.temp`. The destination is
//! replaced once, at commit, by renaming the freshly written snapshot over
//! it, so the destination holds either the previous committed content or
//! the complete new content and never a partial write.
//!
//! Snapshots are themselves written to `<destination>.temp.partial` first
//! and renamed onto `<destination>.temp`, so an interrupted or failed save
//! leaves the previous snapshot intact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::{Dataset, DatasetError};

/// Suffix appended to the destination path for incremental snapshots.
pub const TEMP_SUFFIX: &str = ".temp";

/// Suffix appended to the snapshot path while a snapshot is being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Owns the destination and snapshot paths for one run.
///
/// The destination may be the input file itself (in-place) or a separate
/// output file (copy); the store does not distinguish the two.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    destination: PathBuf,
    temp_path: PathBuf,
    partial_path: PathBuf,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

/// Returns `path` with [`TEMP_SUFFIX`] appended to its final component.
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    with_suffix(path, TEMP_SUFFIX)
}

fn rename(from: &Path, to: &Path) -> Result<(), DatasetError> {
    std::fs::rename(from, to).map_err(|source| DatasetError::Write {
        path: to.to_path_buf(),
        source,
    })
}

impl CheckpointStore {
    /// Creates a store committing to `destination`.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        let temp_path = temp_path_for(&destination);
        let partial_path = with_suffix(&temp_path, PARTIAL_SUFFIX);
        Self {
            destination,
            temp_path,
            partial_path,
        }
    }

    /// Final output path.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Incremental snapshot path.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Writes the dataset to the scratch path and renames it onto the
    /// snapshot path. On failure the previous snapshot, if any, is left as
    /// it was.
    fn write_snapshot(&self, dataset: &Dataset) -> Result<(), DatasetError> {
        if let Err(e) = dataset.write_to(&self.partial_path) {
            let _ = std::fs::remove_file(&self.partial_path);
            return Err(e);
        }
        rename(&self.partial_path, &self.temp_path)
    }

    /// Writes the whole dataset to the snapshot path, leaving the
    /// destination untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Write`] if the snapshot cannot be written.
    /// The previous snapshot remains the latest durable state.
    pub fn save_incremental(&self, dataset: &Dataset) -> Result<(), DatasetError> {
        self.write_snapshot(dataset)?;
        log::info!("Saved checkpoint to {}", self.temp_path.display());
        Ok(())
    }

    /// Writes the whole dataset to the destination and removes the
    /// snapshot.
    ///
    /// The dataset is first written to the snapshot path and then renamed
    /// over the destination; a crash before the rename leaves the
    /// destination as it was and the snapshot holding the latest state.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Write`] if the snapshot cannot be written or
    /// renamed into place.
    pub fn commit_final(&self, dataset: &Dataset) -> Result<(), DatasetError> {
        self.write_snapshot(dataset)?;
        rename(&self.temp_path, &self.destination)?;

        log::info!("Saved final output to {}", self.destination.display());
        log::info!("Removed temporary file {}", self.temp_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_geocoder_models::{Coordinates, GeocodingStatus, Record};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("station_geocoder_checkpoint_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec!["location".to_string(), "subdistrict".to_string()],
            vec![Record::new("วัดสุทธิวราราม", "ช่องนนทรี"), Record::new("b", "c")],
        )
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/data/stations.csv")),
            PathBuf::from("/data/stations.csv.temp")
        );
    }

    #[test]
    fn incremental_save_leaves_destination_untouched() {
        let dir = scratch("incremental");
        let dest = dir.join("out.csv");
        std::fs::write(&dest, "location,subdistrict\noriginal,row\n").unwrap();
        let before = std::fs::read(&dest).unwrap();

        let store = CheckpointStore::new(&dest);
        let mut dataset = sample();
        store.save_incremental(&dataset).unwrap();

        dataset.records_mut()[1].geocoding_status = Some(GeocodingStatus::Error);
        store.save_incremental(&dataset).unwrap();

        // Dropping the store here stands in for a crash before commit.
        drop(store);

        assert_eq!(std::fs::read(&dest).unwrap(), before);
        let snapshot = Dataset::load(&temp_path_for(&dest)).unwrap();
        assert_eq!(snapshot, dataset);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn commit_replaces_destination_and_removes_snapshot() {
        let dir = scratch("commit");
        let dest = dir.join("stations.csv");
        std::fs::write(&dest, "location,subdistrict\nstale,row\n").unwrap();

        let store = CheckpointStore::new(&dest);
        let mut dataset = sample();
        store.save_incremental(&dataset).unwrap();
        dataset.records_mut()[0].coordinates = Some(Coordinates {
            latitude: 13.705_2,
            longitude: 100.534_1,
        });
        store.commit_final(&dataset).unwrap();

        assert!(!store.temp_path().exists());
        assert!(!with_suffix(store.temp_path(), PARTIAL_SUFFIX).exists());
        assert_eq!(Dataset::load(&dest).unwrap(), dataset);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn commit_without_prior_snapshot_creates_destination() {
        let dir = scratch("fresh_commit");
        let dest = dir.join("new.csv");

        let store = CheckpointStore::new(&dest);
        store.commit_final(&sample()).unwrap();

        assert!(dest.exists());
        assert!(!store.temp_path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_save_keeps_previous_snapshot() {
        let dir = scratch("failed_save");
        let dest = dir.join("out.csv");
        let store = CheckpointStore::new(&dest);

        let mut dataset = sample();
        store.save_incremental(&dataset).unwrap();
        let saved = dataset.clone();

        // A directory squatting on the scratch path makes the next write fail.
        std::fs::create_dir(with_suffix(store.temp_path(), PARTIAL_SUFFIX)).unwrap();
        dataset.records_mut()[0].geocoding_status = Some(GeocodingStatus::Error);

        assert!(matches!(
            store.save_incremental(&dataset),
            Err(DatasetError::Write { .. })
        ));
        assert!(matches!(
            store.commit_final(&dataset),
            Err(DatasetError::Write { .. })
        ));

        assert_eq!(Dataset::load(store.temp_path()).unwrap(), saved);
        assert!(!dest.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn interrupted_write_does_not_touch_snapshot() {
        let dir = scratch("interrupted");
        let dest = dir.join("out.csv");
        let store = CheckpointStore::new(&dest);

        let mut dataset = sample();
        store.save_incremental(&dataset).unwrap();
        let saved = dataset.clone();

        // What a process killed halfway through the next save leaves behind.
        let partial = with_suffix(store.temp_path(), PARTIAL_SUFFIX);
        std::fs::write(&partial, "location,subdistrict,search_addr").unwrap();
        assert_eq!(Dataset::load(store.temp_path()).unwrap(), saved);

        dataset.records_mut()[1].coordinates = Some(Coordinates {
            latitude: 13.7,
            longitude: 100.5,
        });
        store.save_incremental(&dataset).unwrap();

        assert!(!partial.exists());
        assert_eq!(Dataset::load(store.temp_path()).unwrap(), dataset);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_snapshot_is_write_error() {
        let dir = scratch("unwritable");
        let store = CheckpointStore::new(dir.join("missing_dir").join("out.csv"));

        assert!(matches!(
            store.save_incremental(&sample()),
            Err(DatasetError::Write { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
