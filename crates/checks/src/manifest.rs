//! Package manifest rules

use pkgcheck_document::{Node, NodeKind};
use pkgcheck_engine::{CheckContext, Checker, CheckerSpec};
use pkgcheck_errors::{CheckError, ManifestError};
use pkgcheck_types::{CheckId, PlatformVersion, Version};
use regex::Regex;

/// Manifest is a strict JSON object
pub const MANIFEST_SYNTAX: CheckId = CheckId::new("PVP-001-1");

/// `name` is a lowercase reverse-domain name
pub const PACKAGE_NAME: CheckId = CheckId::new("PVP-002-1");

/// `version` is SemVer 2.0
pub const PACKAGE_VERSION: CheckId = CheckId::new("PVP-003-1");

/// `unity` and `unityRelease` are well formed
pub const MIN_PLATFORM: CheckId = CheckId::new("PVP-004-1");

/// `dependencies` maps names to SemVer versions
pub const DEPENDENCIES: CheckId = CheckId::new("PVP-005-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "manifest",
    checks: &[
        MANIFEST_SYNTAX,
        PACKAGE_NAME,
        PACKAGE_VERSION,
        MIN_PLATFORM,
        DEPENDENCIES,
    ],
    build,
};

const NAME_PATTERN: &str = r"^[a-z0-9\-_]+(\.[a-z0-9\-_]+)+$";
const RELEASE_PATTERN: &str = r"^\d+[abfp]\d+$";

fn build(ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    let manifest = match ctx.manifest() {
        Ok(manifest) => manifest,
        Err(ManifestError::Invalid(e)) => {
            ctx.error(MANIFEST_SYNTAX, e.to_string())?;
            ctx.skip_all("package manifest is invalid");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let root = manifest.root();

    let name_re = Regex::new(NAME_PATTERN)
        .map_err(|e| CheckError::precondition(format!("invalid name pattern: {e}")))?;
    let release_re = Regex::new(RELEASE_PATTERN)
        .map_err(|e| CheckError::precondition(format!("invalid release pattern: {e}")))?;

    let name = root.get("name");
    match name.as_str() {
        Ok(value) if !name_re.is_match(value) => ctx.error(
            PACKAGE_NAME,
            format!(
                "{}: {value:?} is not a lowercase reverse-domain name",
                name.path()
            ),
        )?,
        Ok(_) => {}
        Err(e) => ctx.error(PACKAGE_NAME, e.to_string())?,
    }

    if let Some(message) = semver_problem(&root.get("version")) {
        ctx.error(PACKAGE_VERSION, message)?;
    }

    let unity = root.get("unity");
    let release = root.get("unityRelease");
    if !unity.is_absent() {
        match unity.as_str() {
            Ok(value) => {
                if let Err(e) = value.parse::<PlatformVersion>() {
                    ctx.error(MIN_PLATFORM, format!("{}: {e}", unity.path()))?;
                }
            }
            Err(e) => ctx.error(MIN_PLATFORM, e.to_string())?,
        }
    }
    if !release.is_absent() {
        match release.as_str() {
            Ok(_) if unity.is_absent() => ctx.error(
                MIN_PLATFORM,
                format!("{}: requires {}", release.path(), unity.path()),
            )?,
            Ok(value) if !release_re.is_match(value) => ctx.error(
                MIN_PLATFORM,
                format!("{}: {value:?} is not a release such as \"0f1\"", release.path()),
            )?,
            Ok(_) => {}
            Err(e) => ctx.error(MIN_PLATFORM, e.to_string())?,
        }
    }

    let dependencies = root.get("dependencies");
    if !dependencies.is_absent() {
        match dependencies.as_object() {
            Ok(members) => {
                for (_, version) in members {
                    if let Some(message) = semver_problem(&version) {
                        ctx.error(DEPENDENCIES, message)?;
                    }
                }
            }
            Err(e) => ctx.error(DEPENDENCIES, e.to_string())?,
        }
    }

    Ok(None)
}

fn semver_problem(node: &Node<'_>) -> Option<String> {
    if node.kind() != NodeKind::String {
        return node.as_str().err().map(|e| e.to_string());
    }
    let value = node.as_str().ok()?;
    Version::parse(value)
        .err()
        .map(|e| format!("{}: {value:?} is not a SemVer 2.0 version: {e}", node.path()))
}
