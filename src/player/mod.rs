//! Playback controller bound to a local media file.
//!
//! The controller owns the playback state machine the presentation layer
//! drives: load a verified local file, then play, pause, and seek it. The
//! embedding layer reports end-of-media through [`PlaybackController::complete`],
//! which the library manager turns into its replay policy. Everything is
//! interior-mutable so the controller can sit behind `&self` inside the
//! library manager.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur during playback operations.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// An operation needed loaded media but none was loaded.
    #[error("no media loaded")]
    NoMediaLoaded,

    /// The media file is missing or unreadable.
    #[error("media file unavailable at {path}: {source}")]
    MediaUnavailable {
        /// The path that could not be opened.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The media file exists but holds no data.
    #[error("media file at {path} is empty")]
    EmptyMedia {
        /// The empty file's path.
        path: PathBuf,
    },
}

/// Current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No media loaded.
    #[default]
    Idle,
    /// Media loaded and advancing.
    Playing,
    /// Media loaded, not advancing.
    Paused,
    /// Media played to its end; a subsequent `play` restarts from zero.
    Finished,
}

/// A successfully loaded media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMedia {
    /// Local path of the file.
    pub path: PathBuf,
    /// File size in bytes at load time.
    pub size_bytes: u64,
}

#[derive(Debug, Default)]
struct PlayerInner {
    state: PlaybackState,
    media: Option<LoadedMedia>,
    position: Duration,
}

/// Playback state machine over a local media file.
#[derive(Debug, Default)]
pub struct PlaybackController {
    inner: Mutex<PlayerInner>,
}

impl PlaybackController {
    /// Creates an idle controller with no media loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the controller to a local media file.
    ///
    /// Loading leaves the controller paused at position zero; call
    /// [`play`](Self::play) to start.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::MediaUnavailable`] when the path does not
    /// exist or cannot be read, and [`PlaybackError::EmptyMedia`] for a
    /// zero-byte file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<(), PlaybackError> {
        let meta = std::fs::metadata(path).map_err(|e| PlaybackError::MediaUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;
        if meta.len() == 0 {
            return Err(PlaybackError::EmptyMedia {
                path: path.to_path_buf(),
            });
        }

        let mut inner = self.lock();
        inner.media = Some(LoadedMedia {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
        });
        inner.state = PlaybackState::Paused;
        inner.position = Duration::ZERO;
        debug!(bytes = meta.len(), "media loaded");
        Ok(())
    }

    /// Starts or resumes playback. From `Finished`, restarts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoMediaLoaded`] with no loaded media, and
    /// [`PlaybackError::MediaUnavailable`] when the file disappeared since
    /// loading.
    pub fn play(&self) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        let media = inner.media.as_ref().ok_or(PlaybackError::NoMediaLoaded)?;

        // The file may have been deleted since load; fail rather than
        // pretending to advance.
        if let Err(e) = std::fs::metadata(&media.path) {
            return Err(PlaybackError::MediaUnavailable {
                path: media.path.clone(),
                source: e,
            });
        }

        if inner.state == PlaybackState::Finished {
            inner.position = Duration::ZERO;
        }
        inner.state = PlaybackState::Playing;
        Ok(())
    }

    /// Pauses playback at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoMediaLoaded`] with no loaded media.
    pub fn pause(&self) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        if inner.media.is_none() {
            return Err(PlaybackError::NoMediaLoaded);
        }
        if inner.state == PlaybackState::Playing {
            inner.state = PlaybackState::Paused;
        }
        Ok(())
    }

    /// Moves the playhead to `position`. From `Finished`, seeking re-arms
    /// the controller into `Paused`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoMediaLoaded`] with no loaded media.
    pub fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        let mut inner = self.lock();
        if inner.media.is_none() {
            return Err(PlaybackError::NoMediaLoaded);
        }
        inner.position = position;
        if inner.state == PlaybackState::Finished {
            inner.state = PlaybackState::Paused;
        }
        Ok(())
    }

    /// Reports end-of-media. The embedding layer calls this when the bound
    /// player signals that the file played to its end; a no-op when no
    /// media is loaded.
    pub fn complete(&self) {
        let mut inner = self.lock();
        if inner.media.is_some() {
            inner.state = PlaybackState::Finished;
        }
    }

    /// Unloads media and returns to `Idle`.
    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = PlayerInner::default();
    }

    /// Returns the current playback state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    /// Returns the current playhead position.
    #[must_use]
    pub fn position(&self) -> Duration {
        self.lock().position
    }

    /// Returns the currently loaded media, if any.
    #[must_use]
    pub fn current_media(&self) -> Option<LoadedMedia> {
        self.lock().media.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
