//! Checker-facing view of a run
//!
//! Checkers never own run state. They read the package through
//! [`CheckContext`] and report findings and skips through it; the
//! orchestrator validates every report against the batch's declared
//! identifiers.

use crate::report::BaselineRecord;
use crate::source::PackageSource;
use pkgcheck_errors::{CheckError, EngineError, ManifestError, PackageError};
use pkgcheck_hash::Hash;
use pkgcheck_manifest::{Manifest, MANIFEST_PATH};
use pkgcheck_net::BaselineService;
use pkgcheck_types::{CheckId, EntrySet, Finding, Skip, TargetContext};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashSet};

/// Read-only inputs shared by every batch, computed on first use
pub(crate) struct Shared<'a> {
    source: &'a dyn PackageSource,
    baselines: &'a dyn BaselineService,
    excluded: &'a BTreeSet<CheckId>,
    manifest: OnceCell<Result<Manifest, ManifestError>>,
    entries: OnceCell<EntrySet>,
}

impl<'a> Shared<'a> {
    pub(crate) fn new(
        source: &'a dyn PackageSource,
        baselines: &'a dyn BaselineService,
        excluded: &'a BTreeSet<CheckId>,
    ) -> Self {
        Self {
            source,
            baselines,
            excluded,
            manifest: OnceCell::new(),
            entries: OnceCell::new(),
        }
    }

    pub(crate) fn source(&self) -> &'a dyn PackageSource {
        self.source
    }

    fn manifest(&self) -> Result<&Manifest, ManifestError> {
        self.manifest
            .get_or_init(|| load_manifest(self.source))
            .as_ref()
            .map_err(Clone::clone)
    }

    fn target(&self) -> TargetContext {
        self.manifest()
            .map(Manifest::target_context)
            .unwrap_or_default()
    }

    pub(crate) fn entries(&self) -> &EntrySet {
        self.entries.get_or_init(|| {
            let target = self.target();
            let entries = EntrySet::synthesize(self.source.files(), &target);
            tracing::debug!(entries = entries.len(), "synthesized entry set");
            entries
        })
    }
}

fn load_manifest(source: &dyn PackageSource) -> Result<Manifest, ManifestError> {
    if !source.contains(MANIFEST_PATH) {
        return Err(ManifestError::Missing);
    }
    let bytes = source.read(MANIFEST_PATH).map_err(|e| match e {
        PackageError::FileNotFound { .. } => ManifestError::Missing,
        other => ManifestError::Unreadable {
            message: other.to_string(),
        },
    })?;
    let manifest = Manifest::parse(&bytes);
    if let Err(e) = &manifest {
        tracing::debug!(error = %e, "manifest unusable");
    }
    manifest
}

/// Reporting state of the batch currently running
#[derive(Debug, Default)]
struct Batch {
    checker: &'static str,
    declared: &'static [CheckId],
    skips: Vec<Skip>,
    failed: HashSet<CheckId>,
}

/// Results accumulated over the whole run
#[derive(Debug, Default)]
pub(crate) struct RunState {
    batch: Batch,
    findings: Vec<Finding>,
    seen: HashSet<Finding>,
    skips: Vec<Skip>,
    baselines: Vec<BaselineRecord>,
    violation: Option<EngineError>,
}

impl RunState {
    pub(crate) fn begin_batch(&mut self, checker: &'static str, declared: &'static [CheckId]) {
        self.batch = Batch {
            checker,
            declared,
            ..Batch::default()
        };
    }

    /// Keep the batch's skips, except those under excluded checks
    pub(crate) fn commit_batch(&mut self, excluded: &BTreeSet<CheckId>) {
        let skips = std::mem::take(&mut self.batch.skips);
        self.skips
            .extend(skips.into_iter().filter(|s| !excluded.contains(&s.check)));
    }

    /// Fail every declared, non-excluded check with `message`; the batch's
    /// skips are dropped
    pub(crate) fn fail_batch(&mut self, message: &str, excluded: &BTreeSet<CheckId>) {
        self.batch.skips.clear();
        for &check in self.batch.declared {
            if !excluded.contains(&check) {
                self.push_finding(Finding::new(check, message));
            }
        }
    }

    pub(crate) fn push_skip(&mut self, skip: Skip) {
        self.skips.push(skip);
    }

    pub(crate) fn take_violation(&mut self) -> Option<EngineError> {
        self.violation.take()
    }

    pub(crate) fn has_violation(&self) -> bool {
        self.violation.is_some()
    }

    fn push_finding(&mut self, finding: Finding) {
        if self.seen.insert(finding.clone()) {
            self.findings.push(finding);
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Finding>, Vec<Skip>, Vec<BaselineRecord>) {
        (self.findings, self.skips, self.baselines)
    }
}

/// What a checker sees of the run
pub struct CheckContext<'a> {
    shared: &'a Shared<'a>,
    state: &'a mut RunState,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(shared: &'a Shared<'a>, state: &'a mut RunState) -> Self {
        Self { shared, state }
    }

    /// Name of the checker being run
    #[must_use]
    pub fn checker(&self) -> &'static str {
        self.state.batch.checker
    }

    #[must_use]
    pub fn source(&self) -> &'a dyn PackageSource {
        self.shared.source
    }

    #[must_use]
    pub fn baselines(&self) -> &'a dyn BaselineService {
        self.shared.baselines
    }

    /// The package manifest, parsed once per run
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Missing` when the package has no manifest, or
    /// the error that made it unusable. Every caller sees the same error.
    pub fn manifest(&self) -> Result<&'a Manifest, ManifestError> {
        self.shared.manifest()
    }

    /// Version facts from the manifest, or the oldest release when it is unusable
    #[must_use]
    pub fn target(&self) -> TargetContext {
        self.shared.target()
    }

    /// Files and synthesized directories, built once per run
    #[must_use]
    pub fn entries(&self) -> &'a EntrySet {
        self.shared.entries()
    }

    /// Report a finding under a declared check
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Contract` if the check is not declared by this
    /// checker or was already skipped. The run aborts either way.
    pub fn error(&mut self, check: CheckId, message: impl Into<String>) -> Result<(), CheckError> {
        self.ensure_declared(check, "reported a finding under")?;
        if self.is_skipped(check) {
            return Err(self.violation(format!("reported a finding under skipped check {check}")));
        }
        self.state.batch.failed.insert(check);
        if !self.shared.excluded.contains(&check) {
            self.state.push_finding(Finding::new(check, message));
        }
        Ok(())
    }

    /// Mark a declared check as not evaluated
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Contract` if the check is not declared, already
    /// skipped, or already has findings. The run aborts either way.
    pub fn skip(&mut self, check: CheckId, reason: impl Into<String>) -> Result<(), CheckError> {
        self.ensure_declared(check, "skipped")?;
        if self.is_skipped(check) {
            return Err(self.violation(format!("skipped check {check} twice")));
        }
        if self.state.batch.failed.contains(&check) {
            return Err(self.violation(format!(
                "skipped check {check} after reporting a finding"
            )));
        }
        let reason = reason.into();
        tracing::warn!(check = %check, reason = %reason, "check skipped");
        self.state.batch.skips.push(Skip::new(check, reason));
        Ok(())
    }

    /// Skip every declared check that has neither been skipped nor failed
    pub fn skip_all(&mut self, reason: &str) {
        for &check in self.state.batch.declared {
            if !self.is_skipped(check) && !self.state.batch.failed.contains(&check) {
                let _ = self.skip(check, reason);
            }
        }
    }

    /// Record a baseline blob the batch relied on
    pub fn record_baseline(&mut self, name: &str, content: &[u8]) -> Hash {
        let hash = Hash::from_data(content);
        let record = BaselineRecord {
            name: name.to_string(),
            hash,
        };
        if !self.state.baselines.contains(&record) {
            tracing::info!(baseline = name, hash = %hash, "baseline used");
            self.state.baselines.push(record);
        }
        hash
    }

    pub(crate) fn has_violation(&self) -> bool {
        self.state.has_violation()
    }

    fn is_skipped(&self, check: CheckId) -> bool {
        self.state.batch.skips.iter().any(|s| s.check == check)
    }

    fn ensure_declared(&mut self, check: CheckId, action: &str) -> Result<(), CheckError> {
        if self.state.batch.declared.contains(&check) {
            Ok(())
        } else {
            Err(self.violation(format!("{action} undeclared check {check}")))
        }
    }

    fn violation(&mut self, message: String) -> CheckError {
        let err = EngineError::ContractViolation {
            checker: self.state.batch.checker.to_string(),
            message,
        };
        tracing::error!(error = %err, "checker contract violated");
        if self.state.violation.is_none() {
            self.state.violation = Some(err.clone());
        }
        CheckError::Contract(err)
    }
}
