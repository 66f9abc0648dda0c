#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for pkgcheck
//!
//! This crate fetches the baselines network-dependent checks compare against:
//! previously published manifests, built-in package lists and the
//! confidential-content index. Requests are blocking and retried on transport
//! failures and server errors with a configurable delay schedule.

mod baseline;
mod client;

pub use baseline::{
    baselines_for, parse_url, BaselineService, FixedBaselines, OfflineBaselines,
    RegistryBaselines,
};
pub use client::{ensure_success, NetClient, NetConfig};
