//! Package manifest error types

use thiserror::Error;

use crate::document::DocumentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Fixed sentinel returned to every consumer when the manifest is absent
    #[error("package manifest package.json not found")]
    Missing,

    #[error("package manifest package.json could not be read: {message}")]
    Unreadable { message: String },

    #[error("package manifest package.json is invalid: {0}")]
    Invalid(#[from] DocumentError),

    #[error("invalid platform version {value:?}: {reason}")]
    InvalidPlatformVersion { value: String, reason: String },

    #[error("invalid package version {value:?}: {reason}")]
    InvalidVersion { value: String, reason: String },
}

impl ManifestError {
    #[must_use]
    pub fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Missing => Some("Add a package.json manifest at the package root."),
            Self::Invalid(_)
            | Self::InvalidPlatformVersion { .. }
            | Self::InvalidVersion { .. } => {
                Some("Fix the manifest at the reported location and re-run the checks.")
            }
            Self::Unreadable { .. } => None,
        }
    }
}
