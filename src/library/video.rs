//! The persisted video record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One downloaded (or downloadable) video in the library.
///
/// The record is an immutable value: the library manager replaces entries
/// wholesale instead of mutating them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Unique id, usually the upstream `resourceId`.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Source URL of the media file, kept for on-demand redownload.
    pub remote_url: String,
    /// Thumbnail source URL, when one was available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Duration in seconds, when the API reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Local media path, set only after a successful download commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_url: Option<PathBuf>,
}

impl Video {
    /// True iff the video can be played without a network connection:
    /// `local_url` is set and the file is actually present.
    #[must_use]
    pub fn is_playable_offline(&self) -> bool {
        self.local_url.as_deref().is_some_and(Path::exists)
    }

    /// Duration formatted as `MM:SS`; an unknown duration renders `00:00`.
    #[must_use]
    pub fn formatted_duration(&self) -> String {
        let total = self.duration.unwrap_or(0);
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Video {
        Video {
            id: "abc123".to_string(),
            title: "Sample".to_string(),
            remote_url: "https://cdn.example.com/abc123.mp4".to_string(),
            thumbnail_url: None,
            duration: Some(125),
            local_url: None,
        }
    }

    #[test]
    fn test_formatted_duration() {
        assert_eq!(sample().formatted_duration(), "02:05");

        let unknown = Video {
            duration: None,
            ..sample()
        };
        assert_eq!(unknown.formatted_duration(), "00:00");
    }

    #[test]
    fn test_not_playable_without_local_url() {
        assert!(!sample().is_playable_offline());
    }

    #[test]
    fn test_not_playable_when_file_missing() {
        let video = Video {
            local_url: Some(PathBuf::from("/nonexistent/abc123.mp4")),
            ..sample()
        };
        assert!(!video.is_playable_offline());
    }

    #[test]
    fn test_serde_round_trip() {
        let video = sample();
        let json = serde_json::to_string(&video).unwrap();
        let back: Video = serde_json::from_str(&json).unwrap();
        assert_eq!(back, video);
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("thumbnail_url"));
        assert!(!json.contains("local_url"));
        assert!(json.contains("\"duration\":125"));
    }
}
