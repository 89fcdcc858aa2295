//! Change events broadcast to library observers.

/// Events emitted by [`VideoLibrary`](super::VideoLibrary).
///
/// Observers receive these over a broadcast channel obtained from
/// `subscribe()`; the payloads are self-contained so no observer ever
/// needs a live reference into the library's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    /// The ordered video list changed (insert or removal).
    VideosUpdated,
    /// An acquisition failed; carries a human-readable description.
    DownloadFailed {
        /// What went wrong, suitable for direct display.
        message: String,
    },
}
