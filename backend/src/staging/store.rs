use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::cleanup::CleanupGuard;

const FILE_PREFIX: &str = "satellite";
const FILE_EXTENSION: &str = "png";

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to create staging directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to write staged file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Owns the staging root. Every per-request file lives directly under it.
#[derive(Clone, Debug)]
pub struct StagingStore {
    root: PathBuf,
}

impl StagingStore {
    /// `root` should be absolute; containment checks compare against it verbatim.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Millisecond timestamp for readability, UUID v4 for uniqueness within the same millisecond.
    pub fn generate_file_name() -> String {
        format!(
            "{}-{}-{}.{}",
            FILE_PREFIX,
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            FILE_EXTENSION
        )
    }

    /// Writes `data` to a fresh file and hands back the guard that will delete it.
    pub async fn stage(&self, data: &[u8]) -> Result<CleanupGuard, StagingError> {
        // create_dir_all succeeds when a concurrent request created the directory first.
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: self.root.display().to_string(),
                source,
            })?;

        let path = self.root.join(Self::generate_file_name());
        let write_error = |source| StagingError::Write {
            path: path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_error)?;

        // From here on the file exists, so the guard owns it even if the write fails.
        let guard = CleanupGuard::new(path.clone());
        file.write_all(data).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;

        log::info!("Staged {} bytes at {}", data.len(), path.display());
        Ok(guard)
    }
}
