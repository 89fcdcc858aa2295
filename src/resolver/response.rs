//! Wire types for the download API's response payloads.
//!
//! The upstream service has shipped several response shapes over time: a
//! top-level array of detail objects, an object keyed by an opaque request
//! id, and a bare error-message object. Instead of probing the JSON by
//! hand, the body is decoded into a closed untagged union and mapped from
//! whichever shape matched.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Closed set of known response payload shapes.
///
/// Variant order matters for untagged decoding: the error shape requires
/// its `message`/`error` key, so it is tried first and cannot swallow a
/// detail payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DetailsPayload {
    /// Bare error object, e.g. `{"message": "invalid link"}`.
    Error(ApiErrorBody),
    /// Top-level array of detail objects.
    Items(Vec<VideoDetails>),
    /// Object keyed by an opaque request id, one detail object per key.
    Keyed(BTreeMap<String, VideoDetails>),
}

impl DetailsPayload {
    /// Extracts the first detail object, however the payload was shaped.
    ///
    /// `BTreeMap` iteration gives the keyed shape a deterministic "first"
    /// entry (lowest key), unlike upstream's arbitrary dictionary order.
    pub(crate) fn into_first_details(self) -> Result<VideoDetails, PayloadIssue> {
        match self {
            Self::Error(body) => Err(PayloadIssue::Upstream(body.into_message())),
            Self::Items(items) => items.into_iter().next().ok_or(PayloadIssue::NoEntries),
            Self::Keyed(map) => map
                .into_iter()
                .next()
                .map(|(_, details)| details)
                .ok_or(PayloadIssue::NoEntries),
        }
    }
}

/// Outcome of a structurally valid payload that still carries no video.
#[derive(Debug)]
pub(crate) enum PayloadIssue {
    /// The payload was the error shape; holds the upstream message.
    Upstream(String),
    /// The payload decoded but contained zero detail entries.
    NoEntries,
}

/// Error-message payload. Both spellings require their key, so this shape
/// never matches a detail object by accident.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Message {
        message: String,
    },
    Error {
        error: String,
    },
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::Message { message } => message,
            Self::Error { error } => error,
        }
    }
}

/// One video's details as returned by the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoDetails {
    /// Upstream identity; older revisions call it `id`.
    #[serde(default, alias = "id")]
    pub resource_id: Option<String>,
    /// Video title; some revisions call it `name`.
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    /// Downloadable variant descriptors.
    #[serde(default)]
    pub urls: Vec<VariantPayload>,
    /// Thumbnail candidates, best first.
    #[serde(default)]
    pub thumbnails: Vec<ThumbnailPayload>,
    /// Duration in seconds, when the revision reports it.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// One downloadable variant descriptor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantPayload {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default, rename = "extension")]
    pub container: Option<String>,
    #[serde(default)]
    pub size_text: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sub_name: Option<String>,
}

/// One thumbnail descriptor.
#[derive(Debug, Deserialize)]
pub(crate) struct ThumbnailPayload {
    pub url: String,
    #[serde(default)]
    #[allow(dead_code)] // Deserialized for Debug output; size is not used for selection
    pub width: Option<u32>,
    #[serde(default)]
    #[allow(dead_code)]
    pub height: Option<u32>,
}
