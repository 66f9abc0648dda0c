//! Asset/companion-file consistency
//!
//! Every visible asset and directory carries a companion `.meta` file next to
//! it, and every companion belongs to exactly one visible asset. Contents of
//! plugin directories are exempt from needing companions once the package
//! targets a release that manages plugins as a whole.

use pkgcheck_engine::{CheckContext, Checker, CheckerSpec};
use pkgcheck_errors::CheckError;
use pkgcheck_types::{CheckId, EntrySet, PathEntry, PlatformVersion};

/// Companion files must belong to a visible, non-companion entry
pub const ORPHANED_COMPANION: CheckId = CheckId::new("PVP-101-1");

/// Visible entries must have a companion file
pub const MISSING_COMPANION: CheckId = CheckId::new("PVP-102-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "consistency",
    checks: &[ORPHANED_COMPANION, MISSING_COMPANION],
    build,
};

/// Suffix of companion files, matched case-sensitively
pub const COMPANION_SUFFIX: &str = ".meta";

fn build(ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    let plugins_exempt = ctx
        .target()
        .targets_at_least(PlatformVersion::PLUGIN_COMPANIONS_OPTIONAL);
    let entries = ctx.entries();

    for entry in entries.iter().filter(|e| !e.is_hidden()) {
        if is_companion(entry) {
            if let Some(problem) = companion_problem(entry, entries) {
                ctx.error(ORPHANED_COMPANION, format!("{problem}: {}", entry.path()))?;
            }
        } else if !(plugins_exempt && entry.in_plugin_dir())
            && !entries.contains(&format!("{}{COMPANION_SUFFIX}", entry.path()))
        {
            ctx.error(
                MISSING_COMPANION,
                format!("missing companion file: {}", entry.path()),
            )?;
        }
    }
    Ok(None)
}

/// Whether the entry's name ends in [`COMPANION_SUFFIX`]
#[must_use]
pub fn is_companion(entry: &PathEntry) -> bool {
    entry.path().ends_with(COMPANION_SUFFIX)
}

fn companion_problem(entry: &PathEntry, entries: &EntrySet) -> Option<&'static str> {
    if entry.is_directory() {
        return Some("directory with companion-file extension");
    }
    let target_path = &entry.path()[..entry.path().len() - COMPANION_SUFFIX.len()];
    match entries.get(target_path) {
        None => Some("companion file without target"),
        Some(target) if target.is_hidden() => Some("companion file for hidden target"),
        Some(target) if is_companion(target) => Some("companion file for a companion file"),
        Some(_) => None,
    }
}
