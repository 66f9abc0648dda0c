//! Check identifiers and the records reported under them

use serde::Serialize;
use std::fmt;

/// Stable name of one rule, `PREFIX-NNN-V`
///
/// Identifiers are declared statically by the checker that owns them. Once
/// published the meaning of an identifier never changes; a behavioral change
/// ships under a new `V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CheckId(&'static str);

impl CheckId {
    #[must_use]
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Whether the identifier has the `PREFIX-NNN-V` shape: an uppercase
    /// prefix, a three-digit rule number and a positive schema version
    #[must_use]
    pub fn is_well_formed(self) -> bool {
        let mut parts = self.0.split('-');
        let (Some(prefix), Some(number), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        !prefix.is_empty()
            && prefix.bytes().all(|b| b.is_ascii_uppercase())
            && number.len() == 3
            && number.bytes().all(|b| b.is_ascii_digit())
            && !version.is_empty()
            && version.bytes().all(|b| b.is_ascii_digit())
            && !version.starts_with('0')
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A failed check with a self-locating message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    pub check: CheckId,
    pub message: String,
}

impl Finding {
    pub fn new(check: CheckId, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

/// A check that was deliberately not evaluated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Skip {
    pub check: CheckId,
    pub reason: String,
}

impl Skip {
    pub fn new(check: CheckId, reason: impl Into<String>) -> Self {
        Self {
            check,
            reason: reason.into(),
        }
    }
}

/// Result of one check over a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
        })
    }
}
