//! Error types for the content pipeline

use thiserror::Error;

/// Errors raised while fetching or shaping CMS content
#[derive(Debug, Error)]
pub enum ContentError {
    /// Network or transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the content service
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// Response body was not the expected JSON shape
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record lacks a field the transform needs
    #[error("malformed record {uid:?}: {reason}")]
    MalformedRecord { uid: String, reason: String },

    #[error("document {uid:?} not found")]
    NotFound { uid: String },

    #[error("invalid date {0:?}")]
    InvalidDate(String),

    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("content service did not advertise a master ref")]
    MissingMasterRef,

    /// Cursor does not point at the configured endpoint
    #[error("invalid cursor {0:?}")]
    InvalidCursor(String),
}

impl ContentError {
    pub(crate) fn malformed(uid: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error concerns one record rather than the whole request
    pub fn is_per_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. } | Self::InvalidDate(_))
    }
}

/// Errors returned by [`crate::content::PostFeed::load_more`]
#[derive(Debug, Error)]
pub enum FeedError {
    /// No further pages exist upstream
    #[error("no more pages to load")]
    Exhausted,

    #[error(transparent)]
    Content(#[from] ContentError),
}
