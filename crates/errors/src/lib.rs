#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the pkgcheck package validator
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can be stored in reports
//! and replayed to every consumer of a cached result.

use std::borrow::Cow;

use thiserror::Error;

pub mod check;
pub mod config;
pub mod document;
pub mod manifest;
pub mod network;
pub mod package;

// Re-export all error types at the root
pub use check::{CheckError, EngineError};
pub use config::ConfigError;
pub use document::{DocumentError, JsonError, JsonErrorKind, YamlError, YamlErrorKind};
pub use manifest::ManifestError;
pub use network::{BaselineError, NetworkError};
pub use package::PackageError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("baseline error: {0}")]
    Baseline(#[from] BaselineError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Self::Document(DocumentError::Json(err))
    }
}

impl From<YamlError> for Error {
    fn from(err: YamlError) -> Self {
        Self::Document(DocumentError::Yaml(err))
    }
}

/// Result type alias for pkgcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Network(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Manifest(err) => err.user_hint(),
            Error::Engine(_) => Some("This is a defect in a checker module; please report it."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Document(_) => Some("error.document"),
            Error::Package(_) => Some("error.package"),
            Error::Manifest(_) => Some("error.manifest"),
            Error::Network(err) => err.user_code(),
            Error::Baseline(_) => Some("error.baseline"),
            Error::Config(err) => err.user_code(),
            Error::Engine(_) => Some("error.engine"),
        }
    }
}
