//! Error types for resolver operations.

use thiserror::Error;

/// Errors that can occur while resolving a source URL into downloadable variants.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input is empty or not an http(s) URL. Rejected before any network call.
    #[error("invalid input '{input}': {reason}")]
    InvalidInput {
        /// The rejected input string.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// Transport-level failure calling the download API (DNS, connect, timeout).
    #[error("network error calling download API for '{input}': {source}")]
    Network {
        /// The input being resolved when the transport failed.
        input: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API reported a business error (non-2xx status or an error payload).
    #[error("download API error for '{input}': {message}")]
    Api {
        /// The input being resolved.
        input: String,
        /// Upstream message when available, otherwise the HTTP status line.
        message: String,
    },

    /// The response body matched none of the known payload shapes.
    #[error("unrecognized download API payload for '{input}': {reason}")]
    Decode {
        /// The input being resolved.
        input: String,
        /// What made the payload undecodable.
        reason: String,
    },
}

impl ResolveError {
    /// Creates an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Network` error from a transport failure.
    pub fn network(input: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            input: input.into(),
            source,
        }
    }

    /// Creates an `Api` error carrying the upstream message.
    #[must_use]
    pub fn api(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a `Decode` error.
    #[must_use]
    pub fn decode(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for transport failures that a bounded retry may fix.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = ResolveError::invalid_input("", "input is empty");
        let msg = err.to_string();
        assert!(msg.contains("invalid input"), "got: {msg}");
        assert!(msg.contains("input is empty"), "got: {msg}");
    }

    #[test]
    fn test_api_display_carries_upstream_message() {
        let err = ResolveError::api("https://youtu.be/abc123", "link expired");
        let msg = err.to_string();
        assert!(msg.contains("link expired"), "got: {msg}");
        assert!(msg.contains("https://youtu.be/abc123"), "got: {msg}");
    }

    #[test]
    fn test_decode_display() {
        let err = ResolveError::decode("https://youtu.be/abc123", "no known shape matched");
        let msg = err.to_string();
        assert!(msg.contains("unrecognized"), "got: {msg}");
        assert!(msg.contains("no known shape matched"), "got: {msg}");
    }

    #[test]
    fn test_only_network_is_transient() {
        assert!(!ResolveError::invalid_input("x", "y").is_transient());
        assert!(!ResolveError::api("x", "y").is_transient());
        assert!(!ResolveError::decode("x", "y").is_transient());
    }
}
