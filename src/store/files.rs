//! Id-keyed media file storage with atomic replace semantics.
//!
//! Each video id owns at most one file per media kind: `{id}.mp4` for the
//! video, `{id}.jpg` for the thumbnail. Writes land in a scratch file under
//! `partial/` first and are renamed into place on commit, so the final
//! destination never holds a half-written payload and a redownload simply
//! replaces the previous file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Directory under the media root holding in-flight scratch files.
const SCRATCH_DIR: &str = "partial";

/// Suffix appended to scratch file names.
const SCRATCH_SUFFIX: &str = "part";

/// Errors that can occur during file store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Creating the media or scratch directory failed.
    #[error("failed to create media directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a payload to the scratch location failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Moving a committed file into its final destination failed.
    #[error("failed to move {from} into place at {to}: {source}")]
    Commit {
        /// The scratch file being moved.
        from: PathBuf,
        /// The final destination.
        to: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Deleting a stored file failed.
    #[error("failed to delete {path}: {source}")]
    Delete {
        /// The file that could not be deleted.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// The kinds of media the store keeps, one file per id per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// The playable video file (`.mp4`).
    Video,
    /// The preview image (`.jpg`).
    Thumbnail,
}

impl MediaKind {
    /// Returns the fixed file extension for this kind.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Thumbnail => "jpg",
        }
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// Id-keyed file storage rooted at the application media directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    scratch: PathBuf,
}

impl FileStore {
    /// Opens the store, creating the media and scratch directories if
    /// missing. Creation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::CreateDir`] when a directory cannot be
    /// created.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        let scratch = root.join(SCRATCH_DIR);
        std::fs::create_dir_all(&root).map_err(|e| StorageError::CreateDir {
            path: root.clone(),
            source: e,
        })?;
        std::fs::create_dir_all(&scratch).map_err(|e| StorageError::CreateDir {
            path: scratch.clone(),
            source: e,
        })?;
        debug!("file store ready");
        Ok(Self { root, scratch })
    }

    /// Returns the media root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the final destination path for an id and kind.
    #[must_use]
    pub fn path_for(&self, id: &str, kind: MediaKind) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_id(id), kind.extension()))
    }

    /// Returns the scratch path downloads should stream into before
    /// [`commit`](Self::commit).
    #[must_use]
    pub fn stage_path(&self, id: &str, kind: MediaKind) -> PathBuf {
        self.scratch.join(format!(
            "{}.{}.{SCRATCH_SUFFIX}",
            sanitize_id(id),
            kind.extension()
        ))
    }

    /// Moves a fully written scratch file into its final destination,
    /// replacing any previous file for the same id and kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Commit`] when the rename fails; the final
    /// destination is left untouched in that case.
    #[instrument(skip(self), fields(id = %id, kind = kind.label()))]
    pub async fn commit(&self, id: &str, kind: MediaKind) -> Result<PathBuf, StorageError> {
        let from = self.stage_path(id, kind);
        let to = self.path_for(id, kind);

        // Verify the staged payload before touching the current file, so a
        // missing stage never destroys the previous committed version.
        tokio::fs::metadata(&from)
            .await
            .map_err(|e| StorageError::Commit {
                from: from.clone(),
                to: to.clone(),
                source: e,
            })?;

        if tokio::fs::metadata(&to).await.is_ok() {
            debug!(path = %to.display(), "replacing existing file");
            tokio::fs::remove_file(&to)
                .await
                .map_err(|e| StorageError::Delete {
                    path: to.clone(),
                    source: e,
                })?;
        }

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| StorageError::Commit {
                from,
                to: to.clone(),
                source: e,
            })?;
        debug!(path = %to.display(), "file committed");
        Ok(to)
    }

    /// Removes a scratch file after a failed download. Best-effort: a
    /// missing scratch file is not an error, other failures are logged.
    pub async fn discard(&self, id: &str, kind: MediaKind) {
        let path = self.stage_path(id, kind);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "scratch file discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to discard scratch file"),
        }
    }

    /// Writes an already-buffered payload for an id and kind in one call
    /// (stage + commit).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the scratch write or the commit fails;
    /// a failure never leaves a half-written file at the final destination.
    pub async fn save(
        &self,
        id: &str,
        kind: MediaKind,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let scratch = self.stage_path(id, kind);
        if let Err(e) = tokio::fs::write(&scratch, bytes).await {
            self.discard(id, kind).await;
            return Err(StorageError::Write {
                path: scratch,
                source: e,
            });
        }
        self.commit(id, kind).await
    }

    /// Returns true when a committed file exists for the id and kind.
    #[must_use]
    pub fn exists(&self, id: &str, kind: MediaKind) -> bool {
        self.path_for(id, kind).exists()
    }

    /// Deletes the committed file for an id and kind. Deleting an absent
    /// file succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] for IO failures other than the file
    /// being absent.
    pub async fn delete(&self, id: &str, kind: MediaKind) -> Result<(), StorageError> {
        let path = self.path_for(id, kind);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete { path, source: e }),
        }
    }
}

/// Maps an upstream id onto a safe file stem.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; everything else becomes
/// `_`. The mapping is deterministic so the same id always lands on the
/// same path.
fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
