#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Checker orchestration for pkgcheck
//!
//! A run walks a fixed registry of [`CheckerSpec`] values. Each checker is
//! one batch: it is built, driven over the package files for as many passes
//! as it asks for, and finished. Everything a checker reports goes through
//! [`CheckContext`], which enforces that reports stay within the identifiers
//! the checker declared. A batch that cannot run at all fails every one of
//! its checks with the same message; a checker that breaks the reporting
//! contract aborts the run.

mod checker;
mod context;
mod orchestrator;
mod report;
mod source;

pub use checker::{BuildFn, Checker, CheckerSpec};
pub use context::CheckContext;
pub use orchestrator::Orchestrator;
pub use report::{BaselineRecord, CheckSummary, RunReport};
pub use source::{validate_path, DirectoryPackage, MemoryPackage, PackageSource};

/// Skip reason when a baseline cannot be fetched
pub const NETWORK_UNAVAILABLE: &str = "network unavailable";

/// Skip reason when a fetched baseline fails validation
pub const INVALID_BASELINE: &str = "invalid baseline";

/// Skip reason for checks excluded in the configuration
pub const EXCLUDED_BY_CONFIGURATION: &str = "excluded by configuration";
