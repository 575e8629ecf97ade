//! Error types for Cloud Controller API calls.
//!
//! This module defines structured errors for all client operations,
//! providing context-rich error messages for debugging and user feedback.

use thiserror::Error;

/// Errors that can occur during Cloud Controller API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API base URL or a derived endpoint is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error calling {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout calling {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    ///
    /// Carries any non-fatal warnings the server attached to the failed
    /// response, so callers can surface them regardless of outcome.
    #[error("HTTP {status} calling {url}")]
    Http {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Warnings extracted from the `X-Cf-Warnings` response header.
        warnings: Vec<String>,
    },

    /// Failed to serialize a request body to JSON.
    #[error("failed to encode request body: {source}")]
    Encode {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to deserialize a response body.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The endpoint whose response could not be decoded.
        url: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// I/O error while streaming the upload body (artifact read or pipe write).
    #[error("upload stream error: {source}")]
    Stream {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A paginated list page contained an item that does not match the
    /// expected resource shape. Signals a server contract violation.
    #[error("unexpected item in list response: {source}")]
    UnexpectedListItem {
        /// The decode failure for the offending item.
        #[source]
        source: serde_json::Error,
    },

    /// The upload join completed with neither an error nor a transport
    /// response. Only reachable if the transmitting task died without
    /// reporting, which the join loop otherwise rules out.
    #[error("upload terminated without a transport response")]
    UploadInterrupted,
}

impl ClientError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error carrying the response's warnings.
    pub fn http(url: impl Into<String>, status: u16, warnings: Vec<String>) -> Self {
        Self::Http {
            url: url.into(),
            status,
            warnings,
        }
    }

    /// Creates a request-body encode error.
    pub fn encode(source: serde_json::Error) -> Self {
        Self::Encode { source }
    }

    /// Creates a response decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an upload stream I/O error.
    pub fn stream(source: std::io::Error) -> Self {
        Self::Stream { source }
    }

    /// Creates an unexpected-list-item error.
    pub fn unexpected_list_item(source: serde_json::Error) -> Self {
        Self::UnexpectedListItem { source }
    }

    /// Returns the warnings attached to this error, if any.
    ///
    /// Only HTTP status errors carry warnings; network and stream failures
    /// happen before a response (and its warning header) exists.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Http { warnings, .. } => warnings,
            _ => &[],
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because most variants require context (url) that the
// source errors don't provide. The helper constructor methods (network(),
// decode(), etc.) are the correct pattern here as they allow callers to
// provide necessary context.
