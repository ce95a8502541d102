//! Snapshot persistence.

use crate::error::EngineError;
use crate::state::RelaySnapshot;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// JSON file holding the whole relay snapshot.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write the snapshot atomically.
    pub async fn save(&self, snapshot: &RelaySnapshot) -> Result<(), EngineError> {
        let data = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved snapshot ({} bytes) to {:?}", data.len(), self.path);
        Ok(())
    }

    /// Load the snapshot, or `None` if the file does not exist yet.
    ///
    /// A file that exists but cannot be decoded is an error.
    pub async fn load(&self) -> Result<Option<RelaySnapshot>, EngineError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {:?}, starting fresh", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: RelaySnapshot = serde_json::from_slice(&data)?;
        info!(
            "Loaded snapshot with {} clients from {:?}",
            snapshot.clients.len(),
            self.path
        );
        Ok(Some(snapshot))
    }
}

/// Where the relay keeps its snapshot.
pub enum SnapshotStore {
    File(FileStore),
    /// No persistence; state is lost on restart.
    Memory,
}

impl SnapshotStore {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SnapshotStore::File(FileStore::new(path))
    }

    pub fn memory() -> Self {
        SnapshotStore::Memory
    }

    pub async fn save(&self, snapshot: &RelaySnapshot) -> Result<(), EngineError> {
        match self {
            SnapshotStore::File(s) => s.save(snapshot).await,
            SnapshotStore::Memory => Ok(()),
        }
    }

    pub async fn load(&self) -> Result<Option<RelaySnapshot>, EngineError> {
        match self {
            SnapshotStore::File(s) => s.load().await,
            SnapshotStore::Memory => Ok(None),
        }
    }
}
