//! Registry baseline rules
//!
//! Compares the manifest against what the package registry already knows:
//! published versions are immutable, and a package may not take the name of
//! one built into the platform release it targets.

use pkgcheck_engine::{CheckContext, Checker, CheckerSpec, NETWORK_UNAVAILABLE};
use pkgcheck_errors::CheckError;
use pkgcheck_types::CheckId;

/// The manifest's version is not already published
pub const UNPUBLISHED_VERSION: CheckId = CheckId::new("PVP-050-1");

/// The package name is not built into its minimum platform release
pub const NOT_BUILTIN: CheckId = CheckId::new("PVP-051-1");

pub const SPEC: CheckerSpec = CheckerSpec {
    name: "baseline",
    checks: &[UNPUBLISHED_VERSION, NOT_BUILTIN],
    build,
};

pub const NO_MIN_PLATFORM: &str = "no minimum platform version declared";
pub const INVALID_MIN_PLATFORM: &str = "invalid minimum platform version";

fn build(ctx: &mut CheckContext<'_>) -> Result<Option<Box<dyn Checker>>, CheckError> {
    let manifest = ctx.manifest()?;
    let name = manifest.name()?;
    let version = manifest.version()?.to_string();
    let baselines = ctx.baselines();

    match baselines.published_manifest(name, &version) {
        Ok(Some(published)) => {
            ctx.record_baseline(
                &format!("registry:{name}@{version}"),
                published.to_json_string().as_bytes(),
            );
            ctx.error(
                UNPUBLISHED_VERSION,
                format!("{name}@{version} is already published"),
            )?;
        }
        Ok(None) => tracing::debug!(package = name, %version, "version not yet published"),
        Err(e) => {
            tracing::warn!(error = %e, "package registry unavailable");
            ctx.skip(UNPUBLISHED_VERSION, NETWORK_UNAVAILABLE)?;
        }
    }

    let platform = match manifest.min_platform() {
        Ok(Some(platform)) => platform,
        Ok(None) => {
            ctx.skip(NOT_BUILTIN, NO_MIN_PLATFORM)?;
            return Ok(None);
        }
        Err(_) => {
            ctx.skip(NOT_BUILTIN, INVALID_MIN_PLATFORM)?;
            return Ok(None);
        }
    };
    match baselines.builtin_packages(platform) {
        Ok(builtins) => {
            let listing: Vec<&str> = builtins.iter().map(String::as_str).collect();
            ctx.record_baseline(&format!("builtins:{platform}"), listing.join("\n").as_bytes());
            if builtins.contains(name) {
                ctx.error(
                    NOT_BUILTIN,
                    format!("{name} is built into platform release {platform}"),
                )?;
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, %platform, "built-in package list unavailable");
            ctx.skip(NOT_BUILTIN, NETWORK_UNAVAILABLE)?;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcheck_document::json;
    use pkgcheck_engine::{MemoryPackage, Orchestrator, RunReport};
    use pkgcheck_net::{BaselineService, FixedBaselines, OfflineBaselines};
    use pkgcheck_types::{CheckOutcome, PlatformVersion};

    const MANIFEST: &str = r#"{"name": "com.example.tools", "version": "1.2.0", "unity": "2022.3"}"#;

    fn run(manifest: &str, baselines: &dyn BaselineService) -> RunReport {
        let package = MemoryPackage::from_files([("package.json", manifest)]).unwrap();
        Orchestrator::new(&[SPEC])
            .unwrap()
            .run(&package, baselines)
            .unwrap()
    }

    #[test]
    fn test_fresh_version_passes() {
        let baselines = FixedBaselines::new()
            .with_registry()
            .with_builtins(PlatformVersion::new(2022, 3), ["com.unity.ugui"]);
        let report = run(MANIFEST, &baselines);
        assert!(report.passed());
        assert_eq!(report.count(CheckOutcome::Pass), 2);
        assert_eq!(report.baselines.len(), 1);
        assert_eq!(report.baselines[0].name, "builtins:2022.3");
    }

    #[test]
    fn test_published_version_and_builtin_name_fail() {
        let published = json::parse(MANIFEST.as_bytes()).unwrap();
        let baselines = FixedBaselines::new()
            .with_published("com.example.tools", "1.2.0", published)
            .with_builtins(PlatformVersion::new(2022, 3), ["com.example.tools"]);
        let report = run(MANIFEST, &baselines);
        let messages: Vec<String> = report.findings.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "PVP-050-1: com.example.tools@1.2.0 is already published",
                "PVP-051-1: com.example.tools is built into platform release 2022.3",
            ]
        );
        let names: Vec<&str> = report.baselines.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["registry:com.example.tools@1.2.0", "builtins:2022.3"]);
    }

    #[test]
    fn test_offline_skips() {
        let report = run(MANIFEST, &OfflineBaselines);
        assert_eq!(report.skip_reason(UNPUBLISHED_VERSION), Some(NETWORK_UNAVAILABLE));
        assert_eq!(report.skip_reason(NOT_BUILTIN), Some(NETWORK_UNAVAILABLE));
    }

    #[test]
    fn test_platform_gate() {
        let report = run(
            r#"{"name": "com.a.b", "version": "1.0.0"}"#,
            &FixedBaselines::new().with_registry(),
        );
        assert_eq!(report.outcome(UNPUBLISHED_VERSION), Some(CheckOutcome::Pass));
        assert_eq!(report.skip_reason(NOT_BUILTIN), Some(NO_MIN_PLATFORM));

        let report = run(
            r#"{"name": "com.a.b", "version": "1.0.0", "unity": "soon"}"#,
            &OfflineBaselines,
        );
        assert_eq!(report.skip_reason(NOT_BUILTIN), Some(INVALID_MIN_PLATFORM));
    }

    #[test]
    fn test_unusable_identity_fails_batch() {
        let report = run(r#"{"name": "com.a.b", "version": "one"}"#, &OfflineBaselines);
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].message, report.findings[1].message);
        assert!(report.findings[0].message.starts_with("invalid package version \"one\""));
    }
}
