use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::SnapshotConfig;
use crate::document::AddressbookDocument;
use crate::error::{SnapshotError, SnapshotResult};
use crate::traits::SnapshotStore;

/// JSON file snapshot store.
///
/// Import reads `data.json`, falling back to `seed.json` when no persistent
/// data exists yet, and to an empty snapshot when neither file exists.
/// Export writes the whole snapshot to a temporary file next to
/// `data.json`, syncs it, and renames it into place, so a crash mid-write
/// leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    config: SnapshotConfig,
}

impl JsonFileSnapshot {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Returns `true` if the persistent data file exists.
    pub fn has_data(&self) -> bool {
        self.config.data_path.exists()
    }

    fn read_file(path: &Path) -> SnapshotResult<Vec<AddressbookDocument>> {
        let file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| SnapshotError::json(path, e))
    }
}

impl SnapshotStore for JsonFileSnapshot {
    fn import(&self) -> SnapshotResult<Vec<AddressbookDocument>> {
        let data_path = &self.config.data_path;
        let seed_path = &self.config.seed_path;

        let documents = if data_path.exists() {
            info!(path = %data_path.display(), "reading persistent snapshot");
            Self::read_file(data_path)?
        } else if seed_path.exists() {
            info!(
                data = %data_path.display(),
                seed = %seed_path.display(),
                "persistent snapshot missing, seeding"
            );
            Self::read_file(seed_path)?
        } else {
            info!(path = %data_path.display(), "no snapshot found, starting empty");
            Vec::new()
        };

        info!(addressbooks = documents.len(), "snapshot imported");
        Ok(documents)
    }

    fn export(&self, documents: &[AddressbookDocument]) -> SnapshotResult<()> {
        if !self.config.persistent {
            debug!("persistence disabled, skipping export");
            return Ok(());
        }

        let data_path = &self.config.data_path;
        let dir = match data_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| SnapshotError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SnapshotError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, documents)
                .map_err(|e| SnapshotError::json(data_path, e))?;
            writer.flush().map_err(|e| SnapshotError::io(data_path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| SnapshotError::io(data_path, e))?;
        tmp.persist(data_path)
            .map_err(|e| SnapshotError::io(data_path, e.error))?;

        debug!(
            path = %data_path.display(),
            addressbooks = documents.len(),
            "snapshot exported"
        );
        Ok(())
    }
}
