//! Document syntax
//!
//! Every `.json` file must be strict JSON and every companion file must be
//! restricted YAML. Hidden files are included: the platform still reads
//! them.

use pkgcheck_document::{json, yaml};
use pkgcheck_engine::{CheckContext, Checker, CheckerSpec};
use pkgcheck_errors::CheckError;
use pkgcheck_types::{CheckId, PathEntry};

use crate::consistency::is_companion;

/// `.json` files parse as strict JSON
pub const JSON_SYNTAX: CheckId = CheckId::new("PVP-020-1");

/// Companion files parse as restricted YAML
pub const COMPANION_SYNTAX: CheckId = CheckId::new("PVP-021-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "syntax",
    checks: &[JSON_SYNTAX, COMPANION_SYNTAX],
    build,
};

/// Largest document the parsers are given
pub const MAX_DOCUMENT_LEN: u64 = 16 * 1024 * 1024;

fn build(_ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    Ok(Some(Box::new(SyntaxChecker)))
}

struct SyntaxChecker;

impl Checker for SyntaxChecker {
    fn check_file(
        &mut self,
        entry: &PathEntry,
        _pass: usize,
        ctx: &mut CheckContext<'_>,
    ) -> Result<(), CheckError> {
        let check = if is_companion(entry) {
            COMPANION_SYNTAX
        } else if entry.extension() == "json" {
            JSON_SYNTAX
        } else {
            return Ok(());
        };

        let size = ctx.source().size(entry.path())?;
        if size > MAX_DOCUMENT_LEN {
            return ctx.error(
                check,
                format!("file too large: {} ({size} bytes)", entry.path()),
            );
        }

        let bytes = ctx.source().read(entry.path())?;
        let problem = if check == JSON_SYNTAX {
            json::parse(&bytes).err().map(|e| e.to_string())
        } else {
            yaml::parse(&bytes).err().map(|e| e.to_string())
        };
        match problem {
            Some(message) => ctx.error(check, format!("{}: {message}", entry.path())),
            None => Ok(()),
        }
    }
}
