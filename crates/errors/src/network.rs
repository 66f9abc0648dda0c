//! Network and baseline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("network unavailable")]
    NetworkUnavailable,
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NetworkUnavailable => {
                Some("Network-dependent checks were skipped; re-run online for full coverage.")
            }
            Self::InvalidUrl(_) => Some("Check the baseline URLs in the configuration file."),
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check your network connection and retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) | Self::DownloadFailed(_) => true,
            Self::HttpError { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::NetworkUnavailable => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::HttpError { .. } => "network.http_error",
            Self::NetworkUnavailable => "network.unavailable",
        })
    }
}

/// A fetched baseline that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaselineError {
    #[error("baseline too short: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("baseline magic mismatch: found {found:#010x}")]
    BadMagic { found: u32 },

    #[error("baseline prefix hashes are not sorted at entry {index}")]
    Unsorted { index: usize },

    #[error("baseline trailer is invalid: {message}")]
    InvalidTrailer { message: String },

    #[error("baseline pattern {pattern:?} is invalid: {message}")]
    InvalidPattern { pattern: String, message: String },
}
