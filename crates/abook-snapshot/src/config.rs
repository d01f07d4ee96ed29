use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the persistent data snapshot.
pub const DATA_FILE_NAME: &str = "data.json";
/// File name of the seed snapshot read when no data snapshot exists.
pub const SEED_FILE_NAME: &str = "seed.json";

/// Where the file-backed snapshot lives and whether it is written at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub data_path: PathBuf,
    pub seed_path: PathBuf,
    /// When `false`, exports are skipped and only the import path is used.
    pub persistent: bool,
}

impl SnapshotConfig {
    /// `data.json` and `seed.json` inside `dir`, persistent.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_path: dir.join(DATA_FILE_NAME),
            seed_path: dir.join(SEED_FILE_NAME),
            persistent: true,
        }
    }

    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::in_dir(".")
    }
}
