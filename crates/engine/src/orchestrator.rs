//! Runs every registered checker over one package

use crate::checker::CheckerSpec;
use crate::context::{CheckContext, RunState, Shared};
use crate::report::{CheckSummary, RunReport};
use crate::source::PackageSource;
use crate::EXCLUDED_BY_CONFIGURATION;
use pkgcheck_errors::{CheckError, EngineError};
use pkgcheck_net::BaselineService;
use pkgcheck_types::{CheckId, CheckOutcome, Skip};
use std::collections::{BTreeMap, BTreeSet};

/// Validated checker registry plus run options
#[derive(Debug, Clone)]
pub struct Orchestrator<'r> {
    registry: &'r [CheckerSpec],
    excluded: BTreeSet<CheckId>,
}

impl<'r> Orchestrator<'r> {
    /// Validate a registry
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCheckId` for an identifier that is not
    /// `PREFIX-NNN-V`, or `EngineError::InvalidRegistry` when a checker
    /// declares nothing or two checkers declare the same identifier.
    pub fn new(registry: &'r [CheckerSpec]) -> Result<Self, EngineError> {
        let mut owners: BTreeMap<CheckId, &'static str> = BTreeMap::new();
        for spec in registry {
            if spec.checks.is_empty() {
                return Err(EngineError::InvalidRegistry {
                    message: format!("checker {} declares no checks", spec.name),
                });
            }
            for &check in spec.checks {
                if !check.is_well_formed() {
                    return Err(EngineError::InvalidCheckId {
                        id: check.as_str().to_string(),
                    });
                }
                if let Some(owner) = owners.insert(check, spec.name) {
                    return Err(EngineError::InvalidRegistry {
                        message: format!(
                            "check {check} is declared by both {owner} and {}",
                            spec.name
                        ),
                    });
                }
            }
        }
        Ok(Self {
            registry,
            excluded: BTreeSet::new(),
        })
    }

    /// Report the named checks as skipped instead of evaluating them
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCheckId` for an identifier no registered
    /// checker declares.
    pub fn exclude<I, S>(mut self, checks: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for check in checks {
            let check = check.as_ref();
            let id = self.find(check).ok_or_else(|| EngineError::InvalidCheckId {
                id: check.to_string(),
            })?;
            self.excluded.insert(id);
        }
        Ok(self)
    }

    /// The declared identifier spelled `check`, if any
    #[must_use]
    pub fn find(&self, check: &str) -> Option<CheckId> {
        self.checks().find(|id| id.as_str() == check)
    }

    /// Every declared identifier in registry order
    pub fn checks(&self) -> impl Iterator<Item = CheckId> + '_ {
        self.registry.iter().flat_map(|spec| spec.checks.iter().copied())
    }

    #[must_use]
    pub fn registry(&self) -> &'r [CheckerSpec] {
        self.registry
    }

    /// Run every checker over `source`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ContractViolation` if a checker reports outside
    /// its declared identifiers or breaks the skip rules. Package problems
    /// never abort a run; they become findings.
    pub fn run(
        &self,
        source: &dyn PackageSource,
        baselines: &dyn BaselineService,
    ) -> Result<RunReport, EngineError> {
        let shared = Shared::new(source, baselines, &self.excluded);
        let mut state = RunState::default();

        for spec in self.registry {
            if spec.checks.iter().all(|c| self.excluded.contains(c)) {
                tracing::debug!(checker = spec.name, "all checks excluded");
            } else {
                self.run_batch(spec, &shared, &mut state)?;
            }
            for &check in spec.checks {
                if self.excluded.contains(&check) {
                    state.push_skip(Skip::new(check, EXCLUDED_BY_CONFIGURATION));
                }
            }
        }

        let (findings, skips, baselines) = state.into_parts();
        let checks: Vec<CheckSummary> = self
            .registry
            .iter()
            .flat_map(|spec| {
                spec.checks.iter().map(|&check| CheckSummary {
                    check,
                    checker: spec.name,
                    outcome: if findings.iter().any(|f| f.check == check) {
                        CheckOutcome::Fail
                    } else if skips.iter().any(|s| s.check == check) {
                        CheckOutcome::Skip
                    } else {
                        CheckOutcome::Pass
                    },
                })
            })
            .collect();

        let report = RunReport {
            checks,
            findings,
            skips,
            baselines,
        };
        tracing::info!(
            passed = report.count(CheckOutcome::Pass),
            failed = report.count(CheckOutcome::Fail),
            skipped = report.count(CheckOutcome::Skip),
            findings = report.findings.len(),
            "run complete"
        );
        Ok(report)
    }

    fn run_batch(
        &self,
        spec: &CheckerSpec,
        shared: &Shared<'_>,
        state: &mut RunState,
    ) -> Result<(), EngineError> {
        tracing::debug!(checker = spec.name, checks = spec.checks.len(), "batch started");
        state.begin_batch(spec.name, spec.checks);

        let outcome = Self::drive(spec, shared, state);
        if let Some(violation) = state.take_violation() {
            return Err(violation);
        }
        match outcome {
            Ok(()) => state.commit_batch(&self.excluded),
            Err(CheckError::Precondition(message)) => {
                tracing::warn!(checker = spec.name, %message, "batch precondition failed");
                state.fail_batch(&message, &self.excluded);
            }
            Err(CheckError::Contract(err)) => return Err(err),
        }
        tracing::debug!(checker = spec.name, "batch finished");
        Ok(())
    }

    fn drive(spec: &CheckerSpec, shared: &Shared<'_>, state: &mut RunState) -> Result<(), CheckError> {
        let mut ctx = CheckContext::new(shared, state);
        let Some(mut checker) = (spec.build)(&mut ctx)? else {
            return Ok(());
        };
        if ctx.has_violation() {
            return Ok(());
        }

        let files = shared.source().files();
        for pass in 0..checker.passes() {
            tracing::debug!(checker = spec.name, pass, "pass started");
            let entries = ctx.entries();
            for path in files {
                let Some(entry) = entries.get(path) else {
                    continue;
                };
                checker.check_file(entry, pass, &mut ctx)?;
                if ctx.has_violation() {
                    return Ok(());
                }
            }
        }
        checker.finish(&mut ctx)
    }
}
