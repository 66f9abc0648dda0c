//! Package source error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PackageError {
    #[error("package root not found: {path}")]
    RootNotFound { path: String },

    #[error("file not found in package: {path}")]
    FileNotFound { path: String },

    #[error("failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("invalid package path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("duplicate package path: {path}")]
    DuplicatePath { path: String },
}
