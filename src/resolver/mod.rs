//! Download API client turning a user-pasted URL into downloadable variants.
//!
//! This module provides the [`Resolver`] trait and its production
//! implementation [`RapidApiResolver`], which calls the third-party
//! download API and maps whichever of its known payload shapes comes back
//! into a [`ResolvedVideo`].
//!
//! # Example
//!
//! ```no_run
//! use offtube::config::ApiConfig;
//! use offtube::resolver::{RapidApiResolver, Resolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = RapidApiResolver::new(&ApiConfig::default());
//! let resolved = resolver.resolve("https://youtu.be/abc123").await?;
//! println!("{}: {} variant(s)", resolved.title, resolved.variants.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod response;

pub use error::ResolveError;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;
use response::{DetailsPayload, PayloadIssue, VideoDetails};

/// Request header carrying the API key.
const HEADER_API_KEY: &str = "x-rapidapi-key";

/// Request header carrying the API host.
const HEADER_API_HOST: &str = "x-rapidapi-host";

/// Endpoint path on the download API.
const DOWNLOAD_ENDPOINT: &str = "/videodownload.php";

/// One concrete downloadable encoding of a video.
///
/// Ephemeral: produced by the resolver, consumed by the selector, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadVariant {
    /// Absolute URL of the media file.
    pub url: String,
    /// String-encoded quality rank (e.g. `"720"`); may be empty.
    pub quality: String,
    /// Container extension reported upstream (e.g. `"mp4"`); may be empty.
    pub container: String,
    /// Human-readable size, when reported.
    pub size_text: Option<String>,
    /// Display name, when reported.
    pub display_name: Option<String>,
}

/// A source URL resolved into identity, title, and downloadable variants.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    /// Upstream identity, or a generated fallback id.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Downloadable variants, in upstream order.
    pub variants: Vec<DownloadVariant>,
    /// Best thumbnail URL, when reported.
    pub thumbnail_url: Option<String>,
    /// Duration in seconds, when reported.
    pub duration: Option<u64>,
}

/// Trait implemented by components that resolve a source URL into variants.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn Resolver>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required for the library manager's seam.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver's name for logs.
    fn name(&self) -> &str;

    /// Resolves the input into identity, title, and variants.
    async fn resolve(&self, input: &str) -> Result<ResolvedVideo, ResolveError>;
}

/// Production resolver backed by the RapidAPI-style download endpoint.
///
/// Sends `GET {base_url}/videodownload.php?url={input}` with the
/// `x-rapidapi-key` / `x-rapidapi-host` header pair and decodes the body
/// through the closed payload union in this module.
pub struct RapidApiResolver {
    client: Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl RapidApiResolver {
    /// Creates a resolver from API connection settings.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            host: config.host.clone(),
        }
    }

    /// Validates the user-supplied input before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidInput`] for empty input, unparseable
    /// URLs, and non-http(s) schemes.
    pub fn validate_input(input: &str) -> Result<(), ResolveError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::invalid_input(input, "input is empty"));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|_| ResolveError::invalid_input(trimmed, "not a valid URL"))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ResolveError::invalid_input(
                trimmed,
                format!("unsupported scheme '{scheme}'"),
            )),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{DOWNLOAD_ENDPOINT}", self.base_url)
    }

    /// Maps one decoded detail object into the resolver's output type.
    fn map_details(&self, input: &str, details: VideoDetails) -> ResolvedVideo {
        let id = match details.resource_id.filter(|value| !value.trim().is_empty()) {
            Some(id) => id,
            None => {
                let generated = uuid::Uuid::new_v4().to_string();
                warn!(
                    input = %input,
                    generated_id = %generated,
                    "upstream response omitted a resource id; generated a fallback"
                );
                generated
            }
        };

        let mut variants = Vec::with_capacity(details.urls.len());
        for payload in details.urls {
            let Some(raw_url) = payload.url.filter(|value| !value.is_empty()) else {
                debug!("skipping variant descriptor without a url");
                continue;
            };
            let Some(absolute) = self.absolutize(&raw_url) else {
                warn!(url = %raw_url, "skipping variant with unjoinable url");
                continue;
            };
            variants.push(DownloadVariant {
                url: absolute,
                quality: payload.quality.unwrap_or_default(),
                container: payload.container.unwrap_or_default(),
                size_text: payload.size_text,
                display_name: payload.name.or(payload.sub_name),
            });
        }

        let title = details
            .title
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                variants
                    .iter()
                    .find_map(|variant| variant.display_name.clone())
            })
            .unwrap_or_else(|| "Untitled video".to_string());

        ResolvedVideo {
            id,
            title,
            variants,
            thumbnail_url: details
                .thumbnails
                .into_iter()
                .next()
                .map(|thumbnail| thumbnail.url),
            duration: details.duration,
        }
    }

    /// Joins a relative variant URL against the API base URL.
    fn absolutize(&self, raw: &str) -> Option<String> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Some(raw.to_string());
        }
        let base = Url::parse(&self.base_url).ok()?;
        base.join(raw).ok().map(String::from)
    }
}

impl std::fmt::Debug for RapidApiResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapidApiResolver")
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for RapidApiResolver {
    fn name(&self) -> &str {
        "rapidapi"
    }

    #[instrument(skip(self), fields(input = %input))]
    async fn resolve(&self, input: &str) -> Result<ResolvedVideo, ResolveError> {
        Self::validate_input(input)?;
        let input = input.trim();

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("url", input)])
            .header(HEADER_API_KEY, &self.api_key)
            .header(HEADER_API_HOST, &self.host)
            .send()
            .await
            .map_err(|e| ResolveError::network(input, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::network(input, e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<response::ApiErrorBody>(&body)
                .map(response::ApiErrorBody::into_message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ResolveError::api(input, message));
        }

        let payload: DetailsPayload =
            serde_json::from_str(&body).map_err(|e| ResolveError::decode(input, e.to_string()))?;

        let details = match payload.into_first_details() {
            Ok(details) => details,
            Err(PayloadIssue::Upstream(message)) => {
                return Err(ResolveError::api(input, message));
            }
            Err(PayloadIssue::NoEntries) => {
                return Err(ResolveError::decode(
                    input,
                    "payload contained no video entries",
                ));
            }
        };

        let resolved = self.map_details(input, details);
        debug!(
            id = %resolved.id,
            variants = resolved.variants.len(),
            "input resolved"
        );
        Ok(resolved)
    }
}
