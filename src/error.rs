//! Errors raised at the content repository boundary

use thiserror::Error;

/// Failure talking to the content repository
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid repository URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cursor {0} does not point at the configured repository")]
    ForeignCursor(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("repository at {0} does not advertise a master ref")]
    NoMasterRef(String),

    #[error("content repository unavailable: {0}")]
    Unavailable(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
