//! Target platform release versions
//!
//! Packages declare the oldest platform release they support as `YEAR.MINOR`
//! (for example `2021.2`). Several rules only apply from a given release on,
//! so the declared value is resolved once into a [`TargetContext`] that every
//! checker consults.

use pkgcheck_errors::ManifestError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A platform release, ordered by `(year, minor)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformVersion {
    pub year: u16,
    pub minor: u16,
}

impl PlatformVersion {
    #[must_use]
    pub const fn new(year: u16, minor: u16) -> Self {
        Self { year, minor }
    }

    /// Release from which plugin directory contents no longer need companions
    pub const PLUGIN_COMPANIONS_OPTIONAL: Self = Self::new(2021, 2);
}

impl FromStr for PlatformVersion {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ManifestError::InvalidPlatformVersion {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (year, minor) = s
            .split_once('.')
            .ok_or_else(|| invalid("expected YEAR.MINOR"))?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("year must be four digits"));
        }
        if minor.is_empty() || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("minor version must be numeric"));
        }
        let year = year.parse().map_err(|_| invalid("year out of range"))?;
        let minor = minor
            .parse()
            .map_err(|_| invalid("minor version out of range"))?;
        Ok(Self { year, minor })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.year, self.minor)
    }
}

impl Serialize for PlatformVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Facts about the package that gate version-dependent rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetContext {
    /// Declared minimum platform release; `None` means the oldest supported
    pub min_platform: Option<PlatformVersion>,
}

impl TargetContext {
    #[must_use]
    pub fn new(min_platform: Option<PlatformVersion>) -> Self {
        Self { min_platform }
    }

    /// Whether the package only targets `version` or newer
    #[must_use]
    pub fn targets_at_least(&self, version: PlatformVersion) -> bool {
        self.min_platform.is_some_and(|min| min >= version)
    }
}
