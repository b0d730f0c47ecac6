use crate::counter::RollCounter;
use crate::history::RollHistory;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

const COUNTS_FILE: &str = "roll_counts.json";
const HISTORY_FILE: &str = "roll_history.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no usable data directory on this platform")]
    NoDataDir,
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat-file persistence: two independent JSON blobs, one for the counts and
/// one for the history, each rewritten after every mutation that touches it.
///
/// Reads degrade to empty state on any problem; writes are fire-and-forget.
/// Neither ever surfaces an error to the user.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Opens (and creates if needed) the data directory. `override_dir` wins
    /// over the platform's per-user location.
    pub fn open(override_dir: Option<PathBuf>) -> Result<Self, StorageError> {
        let dir = match override_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "d20-tally")
                .ok_or(StorageError::NoDataDir)?
                .data_dir()
                .to_path_buf(),
        };
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "storage open");
        Ok(Self { dir })
    }

    pub fn load_counts(&self) -> RollCounter {
        match self.read_json(COUNTS_FILE) {
            Ok(Some(value)) => RollCounter::from_json(&value),
            Ok(None) => RollCounter::new(),
            Err(error) => {
                warn!(%error, "ignoring unreadable roll counts");
                RollCounter::new()
            }
        }
    }

    pub fn save_counts(&self, counter: &RollCounter) {
        if let Err(error) = self.write_json(COUNTS_FILE, &counter.to_json()) {
            warn!(%error, "failed to persist roll counts");
        }
    }

    pub fn load_history(&self) -> RollHistory {
        match self.read_json(HISTORY_FILE) {
            Ok(Some(value)) => RollHistory::from_json(&value),
            Ok(None) => RollHistory::new(),
            Err(error) => {
                warn!(%error, "ignoring unreadable roll history");
                RollHistory::new()
            }
        }
    }

    pub fn save_history(&self, history: &RollHistory) {
        if let Err(error) = self.write_json(HISTORY_FILE, &history.to_json()) {
            warn!(%error, "failed to persist roll history");
        }
    }

    fn read_json(&self, name: &str) -> Result<Option<Value>, StorageError> {
        let path = self.dir.join(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write_json(&self, name: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        fs::write(self.dir.join(name), text)?;
        Ok(())
    }
}

// unit tests
#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(Some(dir.path().to_path_buf())).unwrap();
        (dir, storage)
    }

    #[test]
    fn missing_files_load_as_empty_state() {
        let (_dir, storage) = open_temp();
        assert_eq!(storage.load_counts().total(), 0);
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn counts_round_trip_through_disk() {
        let (_dir, storage) = open_temp();
        let mut counter = RollCounter::new();
        for face in [3, 3, 3, 3, 3, 7, 7] {
            counter.record(face);
        }
        storage.save_counts(&counter);
        assert_eq!(storage.load_counts(), counter);
    }

    #[test]
    fn history_round_trips_through_disk() {
        let (_dir, storage) = open_temp();
        let mut history = RollHistory::new();
        for face in [20, 1, 13] {
            history.push(face);
        }
        storage.save_history(&history);
        assert_eq!(storage.load_history(), history);
    }

    #[test]
    fn corrupt_blob_loads_as_empty_state() {
        let (dir, storage) = open_temp();
        fs::write(dir.path().join(COUNTS_FILE), "not json at all").unwrap();
        fs::write(dir.path().join(HISTORY_FILE), "{]").unwrap();
        assert_eq!(storage.load_counts().total(), 0);
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn open_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        Storage::open(Some(nested.clone())).unwrap();
        assert!(nested.is_dir());
    }
}
