#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package manifest handling for pkgcheck
//!
//! The manifest is the `package.json` document at the package root. It is
//! always read with the strict JSON reader and kept as a document tree, so
//! rules can report problems at the exact member that caused them. This
//! crate adds typed accessors for the members the engine itself relies on.

use pkgcheck_document::{json, Document, Node, NodeKind};
use pkgcheck_errors::{DocumentError, ManifestError};
use pkgcheck_types::{PlatformVersion, TargetContext, Version};

/// Location of the manifest inside a package
pub const MANIFEST_PATH: &str = "package.json";

/// A parsed package manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    document: Document,
}

impl Manifest {
    /// Parse manifest bytes
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Invalid` if the bytes are not strict JSON or the
    /// top-level value is not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let document = json::parse(bytes).map_err(DocumentError::from)?;
        let root = document.root();
        if root.kind() != NodeKind::Object {
            return Err(
                DocumentError::type_mismatch(root.path(), NodeKind::Object, root.kind()).into(),
            );
        }
        Ok(Self { document })
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The top-level object
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.document.root()
    }

    /// Package name
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is missing or not a string.
    pub fn name(&self) -> Result<&str, ManifestError> {
        Ok(self.root().get("name").as_str()?)
    }

    /// Package version
    ///
    /// # Errors
    ///
    /// Returns an error if `version` is missing, not a string, or not SemVer.
    pub fn version(&self) -> Result<Version, ManifestError> {
        let raw = self.root().get("version").as_str()?;
        Version::parse(raw).map_err(|e| ManifestError::InvalidVersion {
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Declared minimum platform release (`unity`)
    ///
    /// # Errors
    ///
    /// Returns an error if `unity` is present but not a `YEAR.MINOR` string.
    pub fn min_platform(&self) -> Result<Option<PlatformVersion>, ManifestError> {
        self.root()
            .opt_str("unity")?
            .map(str::parse)
            .transpose()
    }

    /// Release refinement of the minimum platform (`unityRelease`, e.g. `0f1`)
    ///
    /// # Errors
    ///
    /// Returns an error if `unityRelease` is present but not a string.
    pub fn platform_release(&self) -> Result<Option<&str>, ManifestError> {
        Ok(self.root().opt_str("unityRelease")?)
    }

    /// Declared dependencies as `(name, version node)` pairs in document order
    ///
    /// # Errors
    ///
    /// Returns an error if `dependencies` is present but not an object.
    pub fn dependencies(&self) -> Result<Vec<(&str, Node<'_>)>, ManifestError> {
        let deps = self.root().get("dependencies");
        if deps.is_absent() {
            return Ok(Vec::new());
        }
        Ok(deps.as_object()?)
    }

    /// Version facts used to gate rules; an unusable `unity` value counts as
    /// the oldest supported release
    #[must_use]
    pub fn target_context(&self) -> TargetContext {
        TargetContext::new(self.min_platform().ok().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"{
        "name": "com.example.tools",
        "version": "1.4.0-preview.2",
        "unity": "2021.3",
        "unityRelease": "0f1",
        "dependencies": { "com.example.core": "2.0.0", "com.example.ui": "1.1.0" }
    }"#;

    #[test]
    fn test_typed_accessors() {
        let m = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(m.name().unwrap(), "com.example.tools");
        assert_eq!(m.version().unwrap(), Version::parse("1.4.0-preview.2").unwrap());
        assert_eq!(m.min_platform().unwrap(), Some(PlatformVersion::new(2021, 3)));
        assert_eq!(m.platform_release().unwrap(), Some("0f1"));
        let deps = m.dependencies().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].0, "com.example.ui");
        assert_eq!(deps[1].1.path(), r#".dependencies."com.example.ui""#);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = Manifest::parse(b"[]").unwrap_err();
        assert_eq!(
            err,
            ManifestError::Invalid(DocumentError::TypeMismatch {
                path: ".".into(),
                expected: "object".into(),
                actual: "array".into(),
            })
        );
    }

    #[test]
    fn test_missing_members() {
        let m = Manifest::parse(br#"{"version": 3}"#).unwrap();
        assert_eq!(
            m.name().unwrap_err().to_string(),
            "package manifest package.json is invalid: .name: expected string, found absent"
        );
        assert!(matches!(m.version(), Err(ManifestError::Invalid(_))));
        assert_eq!(m.min_platform().unwrap(), None);
        assert!(m.dependencies().unwrap().is_empty());
        assert_eq!(m.target_context(), TargetContext::default());
    }

    #[test]
    fn test_bad_platform_falls_back_to_oldest() {
        let m = Manifest::parse(br#"{"unity": "latest"}"#).unwrap();
        assert!(m.min_platform().is_err());
        assert_eq!(m.target_context().min_platform, None);
    }
}
