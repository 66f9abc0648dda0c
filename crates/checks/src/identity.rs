//! Companion file identity
//!
//! Each companion file carries a `guid` that identifies its asset across the
//! whole project, so it must be well formed and unique within the package.
//! Companion files the YAML reader rejects are reported by the syntax
//! checker and ignored here.

use std::collections::BTreeMap;

use pkgcheck_document::yaml;
use pkgcheck_engine::{CheckContext, Checker, CheckerSpec};
use pkgcheck_errors::CheckError;
use pkgcheck_types::{CheckId, PathEntry};

use crate::consistency::is_companion;
use crate::syntax::MAX_DOCUMENT_LEN;

/// Companion files declare a 32-digit lowercase hex `guid`
pub const GUID_FORMAT: CheckId = CheckId::new("PVP-022-1");

/// Companion guids are unique within the package
pub const GUID_UNIQUE: CheckId = CheckId::new("PVP-023-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "identity",
    checks: &[GUID_FORMAT, GUID_UNIQUE],
    build,
};

const GUID_LEN: usize = 32;

fn build(_ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    Ok(Some(Box::<IdentityChecker>::default()))
}

#[derive(Default)]
struct IdentityChecker {
    /// guid to companion paths, in file-list order
    owners: BTreeMap<String, Vec<String>>,
}

fn is_guid(value: &str) -> bool {
    value.len() == GUID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl Checker for IdentityChecker {
    fn check_file(
        &mut self,
        entry: &PathEntry,
        _pass: usize,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError> {
        if !is_companion(entry) || entry.is_hidden() {
            return Ok(());
        }
        if ctx.source().size(entry.path())? > MAX_DOCUMENT_LEN {
            return Ok(());
        }
        let Ok(document) = yaml::parse(&ctx.source().read(entry.path())?) else {
            return Ok(());
        };

        let guid = document.root().get("guid");
        if guid.is_absent() {
            return ctx.error(GUID_FORMAT, format!("missing guid: {}", entry.path()));
        }
        match guid.as_str() {
            Ok(value) if is_guid(value) => {
                self.owners
                    .entry(value.to_string())
                    .or_default()
                    .push(entry.path().to_string());
                Ok(())
            }
            Ok(value) => ctx.error(
                GUID_FORMAT,
                format!("invalid guid {value:?}: {}", entry.path()),
            ),
            Err(e) => ctx.error(GUID_FORMAT, format!("{}: {e}", entry.path())),
        }
    }

    fn finish(&mut self, ctx: &mut CheckContext<'_>) -> Result<(), CheckError> {
        for (guid, paths) in &self.owners {
            if paths.len() > 1 {
                ctx.error(
                    GUID_UNIQUE,
                    format!("duplicate guid {guid}: {}", paths.join(", ")),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcheck_engine::{MemoryPackage, Orchestrator, RunReport};
    use pkgcheck_net::OfflineBaselines;
    use pkgcheck_types::CheckOutcome;

    const A: &str = "guid: 0123456789abcdef0123456789abcdef\n";
    const B: &str = "guid: fedcba9876543210fedcba9876543210\n";

    fn run(files: &[(&str, &str)]) -> RunReport {
        let package = MemoryPackage::from_files(files.iter().copied()).unwrap();
        Orchestrator::new(&[SPEC])
            .unwrap()
            .run(&package, &OfflineBaselines)
            .unwrap()
    }

    fn messages(report: &RunReport) -> Vec<String> {
        report.findings.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_unique_guids_pass() {
        let report = run(&[("a.meta", A), ("b.meta", B), ("b.txt", "not a companion")]);
        assert_eq!(report.count(CheckOutcome::Pass), 2);
    }

    #[test]
    fn test_guid_format() {
        let report = run(&[
            ("a.meta", "fileFormatVersion: 2\n"),
            ("b.meta", "guid: 0123456789ABCDEF0123456789ABCDEF\n"),
            ("c.meta", "guid: 12345\n"),
            ("d.meta", "guid: 'broken'\n"),
            (".e.meta", "guid: nope\n"),
        ]);
        assert_eq!(
            messages(&report),
            [
                "PVP-022-1: missing guid: a.meta",
                "PVP-022-1: invalid guid \"0123456789ABCDEF0123456789ABCDEF\": b.meta",
                "PVP-022-1: c.meta: .guid: expected string, found number",
            ]
        );
    }

    #[test]
    fn test_duplicates_reported_once_with_every_owner() {
        let report = run(&[
            ("z.meta", A),
            ("a.meta", A),
            ("m/n.meta", A),
            ("b.meta", B),
        ]);
        assert_eq!(
            messages(&report),
            ["PVP-023-1: duplicate guid 0123456789abcdef0123456789abcdef: a.meta, m/n.meta, z.meta"]
        );
    }

    #[test]
    fn test_only_exact_suffix_is_a_companion() {
        let report = run(&[("a.META", A), ("b.meta", A), ("c.Meta", "guid: 12\n")]);
        assert!(report.findings.is_empty(), "{:?}", messages(&report));
    }
}
