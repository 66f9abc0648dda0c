//! Common test utilities for end-to-end runs
//!
//! This module provides:
//! - On-disk package generation
//! - A mock baseline server with registry, built-in list and index endpoints

pub mod mock_registry;
pub mod package_generator;

pub use mock_registry::MockRegistry;
pub use package_generator::TestPackage;
