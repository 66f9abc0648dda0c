//! Run results

use pkgcheck_hash::Hash;
use pkgcheck_types::{CheckId, CheckOutcome, Finding, Skip};
use serde::Serialize;
use std::fmt::Write;

/// A baseline blob a run consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineRecord {
    pub name: String,
    pub hash: Hash,
}

/// Outcome of one declared check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub check: CheckId,
    pub checker: &'static str,
    pub outcome: CheckOutcome,
}

/// Everything a run found, in a stable order
///
/// Checks appear in registry order, findings in the order they were first
/// reported. Two runs over the same package produce identical reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub checks: Vec<CheckSummary>,
    pub findings: Vec<Finding>,
    pub skips: Vec<Skip>,
    pub baselines: Vec<BaselineRecord>,
}

impl RunReport {
    /// Whether no check failed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.outcome != CheckOutcome::Fail)
    }

    #[must_use]
    pub fn outcome(&self, check: CheckId) -> Option<CheckOutcome> {
        self.checks
            .iter()
            .find(|c| c.check == check)
            .map(|c| c.outcome)
    }

    pub fn findings_for(&self, check: CheckId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.check == check)
    }

    #[must_use]
    pub fn skip_reason(&self, check: CheckId) -> Option<&str> {
        self.skips
            .iter()
            .find(|s| s.check == check)
            .map(|s| s.reason.as_str())
    }

    #[must_use]
    pub fn count(&self, outcome: CheckOutcome) -> usize {
        self.checks.iter().filter(|c| c.outcome == outcome).count()
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering
    #[must_use]
    pub fn render(&self) -> String {
        let mut s = String::new();
        for summary in &self.checks {
            let _ = write!(s, "{} {}", summary.outcome, summary.check);
            if let Some(reason) = self.skip_reason(summary.check) {
                let _ = write!(s, " ({reason})");
            }
            s.push('\n');
            for finding in self.findings_for(summary.check) {
                let _ = writeln!(s, "       {}", finding.message);
            }
        }
        for record in &self.baselines {
            let _ = writeln!(s, "baseline {} {}", record.name, record.hash);
        }
        let _ = writeln!(
            s,
            "{} passed, {} failed, {} skipped",
            self.count(CheckOutcome::Pass),
            self.count(CheckOutcome::Fail),
            self.count(CheckOutcome::Skip)
        );
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: CheckId = CheckId::new("PVP-001-1");
    const B: CheckId = CheckId::new("PVP-002-1");

    fn sample() -> RunReport {
        RunReport {
            checks: vec![
                CheckSummary {
                    check: A,
                    checker: "manifest",
                    outcome: CheckOutcome::Fail,
                },
                CheckSummary {
                    check: B,
                    checker: "manifest",
                    outcome: CheckOutcome::Skip,
                },
            ],
            findings: vec![Finding::new(A, "bad")],
            skips: vec![Skip::new(B, "network unavailable")],
            baselines: Vec::new(),
        }
    }

    #[test]
    fn test_queries() {
        let report = sample();
        assert!(!report.passed());
        assert_eq!(report.outcome(A), Some(CheckOutcome::Fail));
        assert_eq!(report.skip_reason(B), Some("network unavailable"));
        assert_eq!(report.findings_for(A).count(), 1);
        assert_eq!(report.count(CheckOutcome::Skip), 1);
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            sample().render(),
            "fail PVP-001-1\n       bad\nskip PVP-002-1 (network unavailable)\n0 passed, 1 failed, 1 skipped\n"
        );
    }
}
