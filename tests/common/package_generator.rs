//! Test package generation
//!
//! Builds a package directory on disk with a manifest and companion files
//! for every asset and synthesized directory, so a generated package passes
//! the consistency rules unless a test breaks it on purpose.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A package directory that lives as long as the value
pub struct TestPackage {
    dir: TempDir,
    next_guid: u32,
}

impl TestPackage {
    /// A package declaring `name`, `version` and minimum release `unity`
    pub fn new(name: &str, version: &str, unity: &str) -> Self {
        let mut package = Self {
            dir: TempDir::new().expect("create package directory"),
            next_guid: 1,
        };
        package.asset(
            "package.json",
            &format!(r#"{{"name": "{name}", "version": "{version}", "unity": "{unity}"}}"#),
        );
        package
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file without touching companions
    pub fn raw(&mut self, path: &str, content: &[u8]) -> &mut Self {
        let full = self.dir.path().join(path);
        fs::create_dir_all(full.parent().expect("file has a parent")).expect("create directories");
        fs::write(full, content).expect("write file");
        self
    }

    /// Write an asset plus companions for it and every new parent directory
    pub fn asset(&mut self, path: &str, content: &str) -> &mut Self {
        self.raw(path, content.as_bytes());
        let mut owners: BTreeSet<String> = BTreeSet::new();
        let mut prefix = String::new();
        for component in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(component);
            owners.insert(prefix.clone());
        }
        for owner in owners {
            let companion = format!("{owner}.meta");
            if !self.dir.path().join(&companion).exists() {
                let guid = self.guid();
                self.raw(&companion, format!("fileFormatVersion: 2\nguid: {guid}\n").as_bytes());
            }
        }
        self
    }

    fn guid(&mut self) -> String {
        let guid = format!("a{:031x}", self.next_guid);
        self.next_guid += 1;
        guid
    }
}
