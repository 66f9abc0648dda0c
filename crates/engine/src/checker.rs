//! The checker contract

use crate::context::CheckContext;
use pkgcheck_errors::CheckError;
use pkgcheck_types::{CheckId, PathEntry};

/// Constructor of one checker batch
///
/// Returning `Ok(None)` means the checker did all of its work while being
/// built and needs no file passes.
pub type BuildFn = fn(&mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError>;

/// A rule module that visits package files
///
/// For each pass in `0..passes()` the orchestrator calls
/// [`Checker::check_file`] on every file in file-list order, then calls
/// [`Checker::finish`] once.
pub trait Checker {
    fn passes(&self) -> usize {
        1
    }

    /// Inspect one file during `pass`
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Precondition` to fail every check of the batch.
    fn check_file(
        &mut self,
        entry: &PathEntry,
        pass: usize,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError>;

    /// Report anything that needs the whole package
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Precondition` to fail every check of the batch.
    fn finish(&mut self, _ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        Ok(())
    }
}

/// Registry entry for one checker module
#[derive(Debug, Clone, Copy)]
pub struct CheckerSpec {
    pub name: &'static str,
    /// Every identifier the checker may report under
    pub checks: &'static [CheckId],
    pub build: BuildFn,
}

impl CheckerSpec {
    #[must_use]
    pub fn declares(&self, check: CheckId) -> bool {
        self.checks.contains(&check)
    }
}
