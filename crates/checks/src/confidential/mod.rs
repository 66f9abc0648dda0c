//! Confidential-content detection
//!
//! Files are compared against a published index of content that must never
//! ship: by path pattern, by line-break-insensitive hash, and by content
//! rules over decoded text. The index is fetched once per run and recorded
//! as an audit baseline.

pub mod index;
pub mod text;

pub use index::{ConfidentialIndex, PathMatcher};

use pkgcheck_engine::{
    CheckContext, Checker, CheckerSpec, INVALID_BASELINE, NETWORK_UNAVAILABLE,
};
use pkgcheck_errors::CheckError;
use pkgcheck_hash::{digest_reader, prefix_digest, FilteredDigest, PREFIX_LEN};
use pkgcheck_types::{CheckId, PathEntry};

/// File path matches a confidential path pattern
pub const CONFIDENTIAL_PATH: CheckId = CheckId::new("PVP-110-1");

/// File content hashes to a confidential entry
pub const CONFIDENTIAL_HASH: CheckId = CheckId::new("PVP-111-1");

/// File text matches a confidential content rule or keyword
pub const CONFIDENTIAL_CONTENT: CheckId = CheckId::new("PVP-112-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "confidential",
    checks: &[CONFIDENTIAL_PATH, CONFIDENTIAL_HASH, CONFIDENTIAL_CONTENT],
    build,
};

/// Name of the audit record for the index blob
pub const BASELINE_NAME: &str = "confidential-index";

/// Files larger than this are not hashed
pub const MAX_HASHED_LEN: u64 = 512 * 1024 * 1024;

/// Files larger than this are not decoded for content rules
pub const MAX_CONTENT_LEN: u64 = 16 * 1024 * 1024;

fn build(ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    let blob = match ctx.baselines().confidential_blob() {
        Ok(blob) => blob,
        Err(e) => {
            tracing::warn!(error = %e, "confidential-content index unavailable");
            ctx.skip_all(NETWORK_UNAVAILABLE);
            return Ok(None);
        }
    };
    ctx.record_baseline(BASELINE_NAME, &blob);

    match ConfidentialIndex::parse(&blob) {
        Ok(index) => {
            tracing::debug!(entries = index.len(), "confidential-content index loaded");
            Ok(Some(Box::new(ConfidentialChecker { index })))
        }
        Err(e) => {
            tracing::warn!(error = %e, "confidential-content index rejected");
            ctx.skip_all(INVALID_BASELINE);
            Ok(None)
        }
    }
}

struct ConfidentialChecker {
    index: ConfidentialIndex,
}

impl ConfidentialChecker {
    fn check_hash(
        &self,
        entry: &PathEntry,
        size: u64,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError> {
        if self.index.is_empty() || size > MAX_HASHED_LEN {
            return Ok(());
        }
        let source = ctx.source();
        let prefix = prefix_digest(&source.read_prefix(entry.path(), PREFIX_LEN)?);

        let mut full: Option<FilteredDigest> = None;
        for candidate in self.index.candidates(prefix.hash) {
            if u64::from(candidate.min_size) > size {
                continue;
            }
            let digest = match full {
                Some(digest) => digest,
                None => {
                    let reader = source.open(entry.path())?;
                    let digest = digest_reader(reader).map_err(|e| {
                        CheckError::precondition(format!("failed to read {}: {e}", entry.path()))
                    })?;
                    full = Some(digest);
                    digest
                }
            };
            if digest.len == u64::from(candidate.min_size) && digest.hash == candidate.full_hash {
                return ctx.error(
                    CONFIDENTIAL_HASH,
                    format!("confidential content hash match: {}", entry.path()),
                );
            }
        }
        Ok(())
    }

    fn check_content(
        &self,
        entry: &PathEntry,
        size: u64,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError> {
        let (lower, name) = lower_names(entry);
        if self.index.content_ignore.is_match(lower, name) {
            return Ok(());
        }
        let rules: Vec<_> = self
            .index
            .content_rules
            .iter()
            .filter(|rule| rule.paths.is_match(lower, name))
            .collect();
        if rules.is_empty() {
            return Ok(());
        }

        let text = if size > MAX_CONTENT_LEN {
            None
        } else {
            text::decode(&ctx.source().read(entry.path())?)
        };
        let Some(text) = text else {
            return ctx.error(
                CONFIDENTIAL_CONTENT,
                format!("content inconclusive: {}", entry.path()),
            );
        };

        for rule in rules {
            if rule.regex.is_match(&text) {
                ctx.error(
                    CONFIDENTIAL_CONTENT,
                    format!(
                        "confidential content matching {:?}: {}",
                        rule.regex.as_str(),
                        entry.path()
                    ),
                )?;
            }
        }
        if let Some(found) = self.index.keywords.as_ref().and_then(|k| k.find(&text)) {
            ctx.error(
                CONFIDENTIAL_CONTENT,
                format!(
                    "confidential keyword {:?}: {}",
                    found.as_str().to_lowercase(),
                    entry.path()
                ),
            )?;
        }
        Ok(())
    }
}

fn lower_names(entry: &PathEntry) -> (&str, &str) {
    let lower = entry.lower();
    (lower, lower.rsplit('/').next().unwrap_or(lower))
}

impl Checker for ConfidentialChecker {
    fn check_file(
        &mut self,
        entry: &PathEntry,
        _pass: usize,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError> {
        let (lower, name) = lower_names(entry);
        if self.index.path_patterns.is_match(lower, name) {
            ctx.error(
                CONFIDENTIAL_PATH,
                format!("confidential path: {}", entry.path()),
            )?;
        }

        let size = ctx.source().size(entry.path())?;
        self.check_hash(entry, size, ctx)?;
        self.check_content(entry, size, ctx)
    }
}
