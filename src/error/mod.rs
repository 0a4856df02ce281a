//! Unified error handling for kcutils

use reqwest::Method;
use thiserror::Error;

/// Library-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by [`crate::KeycloakClient`]
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Keycloak answered outside the 2xx range.
    #[error("Request failed: statusCode: {status} op: {method}:{url}")]
    RequestFailed {
        status: u16,
        method: Method,
        url: String,
    },

    /// Keycloak answered 2xx but the body did not match the expected shape.
    #[error("Invalid response from {method}:{url}: {source}")]
    InvalidResponse {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A realm or id that is empty or a dot segment; rejected before sending.
    #[error("Invalid path segment '{segment}'")]
    InvalidPathSegment { segment: String },

    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl Error {
    /// True when the failure happened below HTTP, so a retry may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// HTTP status of a [`Error::RequestFailed`], if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
