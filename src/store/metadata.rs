//! JSON persistence of the video library across launches.
//!
//! The whole library is one JSON array in a single `metadata.json`. Saves
//! write to a sibling temp file and rename it into place. Loads never block
//! app usability: a missing file is an empty library, and a corrupt file is
//! reported and treated as empty without being repaired in place.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::files::StorageError;
use crate::library::Video;

/// File name of the persisted library, under the media directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Suffix for the temp file a save is staged through.
const TEMP_SUFFIX: &str = "tmp";

/// Persists the ordered video list as a single JSON document.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Creates a store writing `metadata.json` under `media_dir`.
    #[must_use]
    pub fn new(media_dir: &Path) -> Self {
        Self {
            path: media_dir.join(METADATA_FILE_NAME),
        }
    }

    /// Returns the metadata file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the library and atomically replaces the metadata file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when serialization or the staged write
    /// fails; the previous metadata file is left intact in that case.
    pub async fn save(&self, videos: &[Video]) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(videos).map_err(|e| StorageError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &payload)
            .await
            .map_err(|e| StorageError::Write {
                path: temp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::Commit {
                from: temp,
                to: self.path.clone(),
                source: e,
            })?;
        debug!(path = %self.path.display(), entries = videos.len(), "metadata saved");
        Ok(())
    }

    /// Loads the persisted library.
    ///
    /// A missing file yields an empty library. A corrupt or unreadable file
    /// is reported with a warning and also yields an empty library; the
    /// file itself is left as-is.
    pub async fn load(&self) -> Vec<Video> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no metadata file yet, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "metadata file unreadable, starting with an empty library"
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Video>>(&raw) {
            Ok(videos) => {
                debug!(entries = videos.len(), "metadata loaded");
                videos
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "metadata file corrupt, starting with an empty library"
                );
                Vec::new()
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| METADATA_FILE_NAME.into(), ToOwned::to_owned);
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }
}
