//! Artifact store: the directory of snapshot files.
//!
//! Names follow `books_backup_<YYYYMMDD_HHmmss>.json` so a plain
//! alphabetical listing is already chronological.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

pub const ARTIFACT_PREFIX: &str = "books_backup_";
pub const ARTIFACT_EXT: &str = ".json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the artifact name for a snapshot taken at `at` (one-second
/// granularity, local clock).
pub fn artifact_name(at: DateTime<Local>) -> String {
    format!(
        "{ARTIFACT_PREFIX}{}{ARTIFACT_EXT}",
        at.format("%Y%m%d_%H%M%S")
    )
}

pub fn is_artifact_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_EXT)
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the directory if it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Durably persist `bytes` under `name`. The bytes go to a temporary
    /// sibling first and are renamed into place, so a failed write never
    /// leaves a truncated artifact visible under the final name.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!("{name}.tmp"));
        let path = self.dir.join(name);
        fs::write(&tmp, bytes).await?;
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        debug!(artifact = %name, size = bytes.len(), "artifact written");
        Ok(())
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.dir.join(name)).await.unwrap_or(false)
    }

    /// Every artifact matching the naming pattern, in natural directory
    /// order. Callers wanting chronology sort the names.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_artifact_name(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Idempotent: deleting a missing artifact is not an error.
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => {
                debug!(artifact = %name, "artifact deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
