//! The library manager: the single owner of the ordered video list.
//!
//! [`VideoLibrary`] orchestrates the resolver, the variant selector, the
//! streaming download client, the file store, and the metadata store, and
//! drives the playback controller. It is the only component that mutates
//! the list or the persisted metadata.
//!
//! # Concurrency model
//!
//! Network and disk transfers run outside the state lock, so several
//! acquisitions may be in flight at once (each targets its own id-keyed
//! paths). List mutations and metadata saves happen under one
//! `tokio::sync::Mutex`, which is all the serialization the value-typed
//! entries need.
//!
//! # Observation
//!
//! Observers take an immutable [`snapshot`](VideoLibrary::snapshot) and
//! subscribe to [`LibraryEvent`]s over a broadcast channel; no live
//! reference to the mutable list ever escapes.

mod events;
mod retry;
mod video;

pub use events::LibraryEvent;
pub use retry::RetryPolicy;
pub use video::Video;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::download::{DownloadError, HttpClient};
use crate::player::{PlaybackController, PlaybackError};
use crate::resolver::{ResolveError, ResolvedVideo, Resolver};
use crate::selector::select_variant;
use crate::store::{FileStore, MediaKind, MetadataStore, StorageError};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Errors surfaced by library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Resolving the input failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Downloading the media file failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A filesystem operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The playback controller rejected an operation.
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// The resolver returned no usable variant for the input.
    #[error("no usable download variant for '{input}'")]
    NoVariant {
        /// The input that resolved to an empty variant set.
        input: String,
    },

    /// An index was outside the current library bounds.
    #[error("index {index} out of bounds for library of {len} video(s)")]
    IndexOutOfBounds {
        /// The rejected index.
        index: usize,
        /// The library length at the time.
        len: usize,
    },

    /// An operation needed a current video but the library is empty.
    #[error("the library is empty")]
    Empty,
}

#[derive(Debug, Default)]
struct LibraryState {
    videos: Vec<Video>,
    current_index: usize,
}

/// The library manager owning the ordered, most-recent-first video list.
pub struct VideoLibrary {
    resolver: Arc<dyn Resolver>,
    client: HttpClient,
    store: FileStore,
    metadata: MetadataStore,
    player: PlaybackController,
    events: broadcast::Sender<LibraryEvent>,
    target_quality: u32,
    retry: RetryPolicy,
    state: Mutex<LibraryState>,
}

impl std::fmt::Debug for VideoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoLibrary")
            .field("resolver", &self.resolver.name())
            .field("store", &self.store)
            .field("target_quality", &self.target_quality)
            .finish_non_exhaustive()
    }
}

impl VideoLibrary {
    /// Opens the library: prepares the media directories, loads persisted
    /// metadata, and reconciles each entry against what is actually on
    /// disk (a `local_url` is trusted only if the file still exists).
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Storage`] when the media directories cannot
    /// be created. Metadata problems never fail the open; they degrade to
    /// an empty library with a warning.
    #[instrument(skip_all, fields(media_dir = %config.media_dir.display()))]
    pub async fn open(
        config: &AppConfig,
        resolver: Arc<dyn Resolver>,
    ) -> Result<Self, LibraryError> {
        let store = FileStore::open(&config.media_dir)?;
        let metadata = MetadataStore::new(&config.media_dir);

        let mut videos = metadata.load().await;
        for video in &mut videos {
            if let Some(path) = &video.local_url
                && !path.exists()
            {
                warn!(
                    id = %video.id,
                    path = %path.display(),
                    "local file missing, clearing stale local path"
                );
                video.local_url = None;
            }
        }
        info!(entries = videos.len(), "library opened");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            resolver,
            client: HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs),
            store,
            metadata,
            player: PlaybackController::new(),
            events,
            target_quality: config.target_quality,
            retry: RetryPolicy::new(config.resolve_attempts, config.resolve_backoff()),
            state: Mutex::new(LibraryState {
                videos,
                current_index: 0,
            }),
        })
    }

    /// Subscribes to library change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.events.subscribe()
    }

    /// Returns an immutable snapshot of the video list, most recent first.
    pub async fn snapshot(&self) -> Vec<Video> {
        self.state.lock().await.videos.clone()
    }

    /// Returns the number of videos in the library.
    pub async fn len(&self) -> usize {
        self.state.lock().await.videos.len()
    }

    /// Returns true when the library holds no videos.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.videos.is_empty()
    }

    /// Returns the cursor position.
    pub async fn current_index(&self) -> usize {
        self.state.lock().await.current_index
    }

    /// Returns the playback controller for state inspection and the
    /// end-of-media signal.
    #[must_use]
    pub fn player(&self) -> &PlaybackController {
        &self.player
    }

    /// Resolves a pasted URL, downloads the selected variant, and inserts
    /// the new video at the head of the library.
    ///
    /// The video only enters the list once its media file is committed
    /// locally. A thumbnail failure is logged and dropped; it never fails
    /// the acquisition. Exactly one [`LibraryEvent::VideosUpdated`] fires
    /// on success; any failure fires [`LibraryEvent::DownloadFailed`]
    /// instead and leaves the library unchanged.
    ///
    /// # Errors
    ///
    /// Returns the typed error of whichever stage failed: resolve,
    /// selection, download, or persistence.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn add_from_url(&self, input: &str) -> Result<Video, LibraryError> {
        match self.acquire(input).await {
            Ok(video) => {
                self.notify(LibraryEvent::VideosUpdated);
                info!(id = %video.id, title = %video.title, "video added");
                Ok(video)
            }
            Err(error) => {
                self.notify(LibraryEvent::DownloadFailed {
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn acquire(&self, input: &str) -> Result<Video, LibraryError> {
        let resolved = self.resolve_with_retry(input).await?;

        let variant = select_variant(&resolved.variants, self.target_quality).ok_or_else(|| {
            LibraryError::NoVariant {
                input: input.to_string(),
            }
        })?;
        debug!(quality = %variant.quality, url = %variant.url, "variant selected");

        let local_path = self
            .download_media(&resolved.id, MediaKind::Video, &variant.url)
            .await?;

        let thumbnail_url = self.fetch_thumbnail(&resolved).await;

        let video = Video {
            id: resolved.id,
            title: resolved.title,
            remote_url: variant.url.clone(),
            thumbnail_url,
            duration: resolved.duration,
            local_url: Some(local_path),
        };

        let mut state = self.state.lock().await;
        state.videos.insert(0, video.clone());
        if let Err(error) = self.metadata.save(&state.videos).await {
            // Roll the insert back so a failed acquisition leaves the
            // library exactly as it was.
            state.videos.remove(0);
            return Err(error.into());
        }
        Ok(video)
    }

    /// Downloads the thumbnail when the resolver reported one. Failures
    /// only cost the preview image, so they are logged and swallowed.
    async fn fetch_thumbnail(&self, resolved: &ResolvedVideo) -> Option<String> {
        let url = resolved.thumbnail_url.as_ref()?;
        match self
            .download_media(&resolved.id, MediaKind::Thumbnail, url)
            .await
        {
            Ok(_) => Some(url.clone()),
            Err(error) => {
                warn!(
                    id = %resolved.id,
                    error = %error,
                    "thumbnail download failed, continuing without preview"
                );
                None
            }
        }
    }

    /// Streams one media file into the store's scratch location and commits
    /// it into place.
    async fn download_media(
        &self,
        id: &str,
        kind: MediaKind,
        url: &str,
    ) -> Result<PathBuf, LibraryError> {
        let scratch = self.store.stage_path(id, kind);
        if let Err(error) = self.client.download_to_path(url, &scratch).await {
            self.store.discard(id, kind).await;
            return Err(error.into());
        }
        Ok(self.store.commit(id, kind).await?)
    }

    async fn resolve_with_retry(&self, input: &str) -> Result<ResolvedVideo, ResolveError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.resolver.resolve(input).await {
                Ok(resolved) => return Ok(resolved),
                Err(error) => match self.retry.should_retry(&error, attempt) {
                    Some(delay) => {
                        info!(
                            attempt,
                            max_attempts = self.retry.max_attempts(),
                            delay_ms = delay.as_millis(),
                            error = %error,
                            "retrying resolve"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(error),
                },
            }
        }
    }

    /// Removes the video at `index`, deleting its backing files
    /// best-effort, and persists the shrunk list.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::IndexOutOfBounds`] for an invalid index.
    /// File deletion and metadata persistence failures are logged, not
    /// propagated.
    #[instrument(skip(self))]
    pub async fn remove(&self, index: usize) -> Result<Video, LibraryError> {
        let mut state = self.state.lock().await;
        let len = state.videos.len();
        if index >= len {
            return Err(LibraryError::IndexOutOfBounds { index, len });
        }

        let video = state.videos.remove(index);
        for kind in [MediaKind::Video, MediaKind::Thumbnail] {
            if let Err(error) = self.store.delete(&video.id, kind).await {
                warn!(
                    id = %video.id,
                    kind = kind.label(),
                    error = %error,
                    "failed to delete backing file"
                );
            }
        }

        if state.current_index >= state.videos.len() {
            state.current_index = state.videos.len().saturating_sub(1);
        }

        if let Err(error) = self.metadata.save(&state.videos).await {
            warn!(error = %error, "failed to persist metadata after removal");
        }
        drop(state);

        self.notify(LibraryEvent::VideosUpdated);
        info!(id = %video.id, "video removed");
        Ok(video)
    }

    /// Moves the cursor to `index` without starting playback.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::IndexOutOfBounds`] for an invalid index.
    pub async fn select(&self, index: usize) -> Result<(), LibraryError> {
        let mut state = self.state.lock().await;
        let len = state.videos.len();
        if index >= len {
            return Err(LibraryError::IndexOutOfBounds { index, len });
        }
        state.current_index = index;
        Ok(())
    }

    /// Plays the current video, downloading it on demand when no verified
    /// local file exists.
    ///
    /// The just-in-time download reuses the store's atomic replace path and
    /// updates `local_url` (and the persisted metadata) before the
    /// controller is bound, so a successful return means "ready to play".
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Empty`] on an empty library, a download or
    /// storage error when the on-demand fetch fails, or a playback error
    /// when the controller rejects the file.
    #[instrument(skip(self))]
    pub async fn play_current(&self) -> Result<Video, LibraryError> {
        let mut video = {
            let state = self.state.lock().await;
            let Some(video) = state.videos.get(state.current_index) else {
                return Err(LibraryError::Empty);
            };
            video.clone()
        };

        let verified = video.local_url.clone().filter(|path| path.exists());
        let path = if let Some(path) = verified {
            path
        } else {
            info!(id = %video.id, "no verified local file, downloading before playback");
            let path = self
                .download_media(&video.id, MediaKind::Video, &video.remote_url)
                .await?;

            let mut state = self.state.lock().await;
            if let Some(entry) = state.videos.iter_mut().find(|entry| entry.id == video.id) {
                entry.local_url = Some(path.clone());
            }
            if let Err(error) = self.metadata.save(&state.videos).await {
                warn!(error = %error, "failed to persist metadata after on-demand download");
            }
            video.local_url = Some(path.clone());
            path
        };

        self.player.load(&path)?;
        self.player.play()?;
        info!(id = %video.id, path = %path.display(), "playback started");
        Ok(video)
    }

    /// Pauses playback.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoMediaLoaded`] when nothing is loaded.
    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.player.pause()
    }

    /// Resumes playback.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError`] when nothing is loaded or the file is gone.
    pub fn resume(&self) -> Result<(), PlaybackError> {
        self.player.play()
    }

    /// Advances the cursor and plays the newly current video. A no-op at
    /// the last index: the cursor stays put and nothing is re-triggered.
    ///
    /// # Errors
    ///
    /// Propagates [`play_current`](Self::play_current) errors after a
    /// successful move.
    pub async fn next(&self) -> Result<Option<Video>, LibraryError> {
        {
            let mut state = self.state.lock().await;
            if state.current_index + 1 >= state.videos.len() {
                return Ok(None);
            }
            state.current_index += 1;
        }
        self.play_current().await.map(Some)
    }

    /// Moves the cursor back and plays the newly current video. A no-op at
    /// index zero.
    ///
    /// # Errors
    ///
    /// Propagates [`play_current`](Self::play_current) errors after a
    /// successful move.
    pub async fn previous(&self) -> Result<Option<Video>, LibraryError> {
        {
            let mut state = self.state.lock().await;
            if state.current_index == 0 {
                return Ok(None);
            }
            state.current_index -= 1;
        }
        self.play_current().await.map(Some)
    }

    /// Reacts to the controller's end-of-media signal by replaying the
    /// same video (the library loops a finished video rather than
    /// advancing).
    ///
    /// # Errors
    ///
    /// Propagates [`play_current`](Self::play_current) errors.
    pub async fn playback_finished(&self) -> Result<Video, LibraryError> {
        debug!("media finished, looping current video");
        self.play_current().await
    }

    fn notify(&self, event: LibraryEvent) {
        // No receivers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }
}
