#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Document model for pkgcheck
//!
//! Package manifests are read with a strict JSON reader and companion files
//! with a restricted YAML reader. Both produce the same immutable, arena
//! backed [`Document`] tree whose nodes can always report their own jq-style
//! location, which is what every finding message embeds.

mod emit;
pub mod json;
mod tree;
pub mod yaml;

pub use json::JsonOptions;
pub use tree::{format_path, Document, Node, NodeId, NodeKind, Number, PathKey};
pub use yaml::YamlOptions;
