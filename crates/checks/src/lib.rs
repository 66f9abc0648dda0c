#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Rule modules for pkgcheck
//!
//! Each module exposes a `SPEC` value naming its checker and the check
//! identifiers it reports under. [`REGISTRY`] lists them in run order:
//! manifest and document rules first, then the network baselines, then the
//! file-level consistency and confidential-content rules.

pub mod baseline;
pub mod confidential;
pub mod consistency;
pub mod identity;
pub mod manifest;
pub mod syntax;

use pkgcheck_engine::{CheckerSpec, Orchestrator};
use pkgcheck_errors::EngineError;

/// Every checker, in run order
pub const REGISTRY: &[CheckerSpec] = &[
    manifest::SPEC,
    syntax::SPEC,
    identity::SPEC,
    baseline::SPEC,
    consistency::SPEC,
    confidential::SPEC,
];

/// Orchestrator over the full registry
///
/// # Errors
///
/// Returns an error if the registry declares a malformed or duplicate
/// check identifier.
pub fn orchestrator() -> Result<Orchestrator<'static>, EngineError> {
    Orchestrator::new(REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_valid() {
        let orchestrator = orchestrator().unwrap();
        assert_eq!(orchestrator.checks().count(), 16);
        assert!(orchestrator.find("PVP-111-1").is_some());
        assert!(orchestrator.find("PVP-999-1").is_none());
    }
}
