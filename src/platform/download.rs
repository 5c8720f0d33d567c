//! Saves downloads into a local directory

use crate::error::{Error, Result};
use crate::platform::Downloader;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Writes each download to `<directory>/<filename>`, replacing an existing file
#[derive(Debug, Clone)]
pub struct FileDownloader {
    directory: PathBuf,
}

impl FileDownloader {
    /// Save downloads into `directory`, created on first use
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Target directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn download(&self, bytes: Bytes, filename: &str) -> Result<()> {
        // Only the final path component is honoured.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| Error::Download(format!("invalid filename '{filename}'")))?;

        if !self.directory.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
                Error::Download(format!(
                    "Failed to create directory {}: {e}",
                    self.directory.display()
                ))
            })?;
        }

        let path = self.directory.join(name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| Error::Download(format!("Failed to write {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved download");
        Ok(())
    }
}
