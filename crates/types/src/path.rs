//! Path classification
//!
//! A package lists only files, so directories are synthesized from every
//! proper `/`-bounded prefix of a file path. [`EntrySet`] holds both kinds,
//! built once per run and shared by every checker that needs
//! directory-level facts.

use crate::platform::{PlatformVersion, TargetContext};
use std::collections::{BTreeMap, HashMap};

/// Directory extensions whose contents are managed as one opaque plugin,
/// with the release that introduced each (`None`: every release)
pub const PLUGIN_EXTENSIONS: &[(&str, Option<PlatformVersion>)] = &[
    ("bundle", None),
    ("framework", None),
    ("plugin", None),
    ("xcframework", Some(PlatformVersion::new(2021, 2))),
    ("androidlib", Some(PlatformVersion::new(2021, 2))),
];

const RESERVED_NAMES: &[&str] = &["cvs"];

/// Read-only view of one package path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    path: String,
    lower: String,
    components: Vec<String>,
    raw_extension: String,
    extension: String,
    is_hidden: bool,
    in_plugin_dir: bool,
    is_directory: bool,
}

impl PathEntry {
    /// Classify a file path
    #[must_use]
    pub fn new(path: &str, ctx: &TargetContext) -> Self {
        Self::classify(path, ctx, false)
    }

    /// Classify a synthesized directory path
    #[must_use]
    pub fn directory(path: &str, ctx: &TargetContext) -> Self {
        Self::classify(path, ctx, true)
    }

    fn classify(path: &str, ctx: &TargetContext, is_directory: bool) -> Self {
        let components: Vec<String> = path.split('/').map(str::to_string).collect();
        let filename = components.last().map_or("", String::as_str);
        let raw_extension = extension_of(filename).to_string();
        let extension = raw_extension.to_ascii_lowercase();
        let lower = path.to_ascii_lowercase();

        let is_hidden = components.iter().any(|c| {
            c.starts_with('.')
                || c.ends_with('~')
                || RESERVED_NAMES.iter().any(|r| c.eq_ignore_ascii_case(r))
        }) || lower.ends_with(".tmp");

        let ancestors = &components[..components.len().saturating_sub(1)];
        let in_plugin_dir = ancestors.iter().any(|c| {
            let ext = extension_of(c).to_ascii_lowercase();
            PLUGIN_EXTENSIONS.iter().any(|(plugin, since)| {
                *plugin == ext && since.map_or(true, |v| ctx.targets_at_least(v))
            })
        });

        Self {
            path: path.to_string(),
            lower,
            components,
            raw_extension,
            extension,
            is_hidden,
            in_plugin_dir,
            is_directory,
        }
    }

    /// Path as listed by the package, `/`-separated
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn lower(&self) -> &str {
        &self.lower
    }

    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        self.components.last().map_or("", String::as_str)
    }

    /// Lowercase extension without the dot; empty when there is none
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extension as spelled in the path
    #[must_use]
    pub fn raw_extension(&self) -> &str {
        &self.raw_extension
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    #[must_use]
    pub fn in_plugin_dir(&self) -> bool {
        self.in_plugin_dir
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }
}

/// Text after the last dot of a name, unless the dot leads the name
fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(at) => &name[at + 1..],
    }
}

/// Files plus synthesized directories, sorted by path
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    entries: Vec<PathEntry>,
    index: HashMap<String, usize>,
}

impl EntrySet {
    /// Build the set from a package file list
    ///
    /// A file and a directory can share a path only in a malformed in-memory
    /// listing; the file wins.
    #[must_use]
    pub fn synthesize<S: AsRef<str>>(files: &[S], ctx: &TargetContext) -> Self {
        let mut by_path: BTreeMap<&str, bool> = BTreeMap::new();
        for file in files {
            let file = file.as_ref();
            by_path.insert(file, false);
            for (at, _) in file.match_indices('/') {
                by_path.entry(&file[..at]).or_insert(true);
            }
        }

        let entries: Vec<PathEntry> = by_path
            .into_iter()
            .map(|(path, is_dir)| PathEntry::classify(path, ctx, is_dir))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path.clone(), i))
            .collect();
        Self { entries, index }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(v: Option<(u16, u16)>) -> TargetContext {
        TargetContext::new(v.map(|(y, m)| PlatformVersion::new(y, m)))
    }

    #[test]
    fn test_components_and_extension() {
        let e = PathEntry::new("Runtime/Scripts/Player.CS", &ctx(None));
        assert_eq!(e.components(), ["Runtime", "Scripts", "Player.CS"]);
        assert_eq!(e.filename(), "Player.CS");
        assert_eq!(e.extension(), "cs");
        assert_eq!(e.raw_extension(), "CS");
        assert_eq!(e.lower(), "runtime/scripts/player.cs");
        assert!(!e.is_hidden());
        assert!(!e.is_directory());

        assert_eq!(PathEntry::new(".gitignore", &ctx(None)).extension(), "");
        assert_eq!(PathEntry::new("LICENSE", &ctx(None)).extension(), "");
    }

    #[test]
    fn test_hidden_rules() {
        let c = ctx(None);
        for hidden in [
            ".git/config",
            "Samples~/Demo/a.cs",
            "a/CVS/Entries",
            "a/b.TMP",
            "docs/.hidden.md",
        ] {
            assert!(PathEntry::new(hidden, &c).is_hidden(), "{hidden}");
        }
        for visible in ["a/b.cs", "cvsutil/a.cs", "a~b/c.txt", "tmp/a.txt"] {
            assert!(!PathEntry::new(visible, &c).is_hidden(), "{visible}");
        }
    }

    #[test]
    fn test_plugin_directories_are_version_gated() {
        let old = ctx(Some((2020, 3)));
        let new = ctx(Some((2021, 2)));

        let inside = "Plugins/iOS/Lib.framework/Headers/lib.h";
        assert!(PathEntry::new(inside, &old).in_plugin_dir());
        assert!(PathEntry::new(inside, &ctx(None)).in_plugin_dir());

        let xc = "Plugins/Lib.xcframework/Info.plist";
        assert!(!PathEntry::new(xc, &old).in_plugin_dir());
        assert!(!PathEntry::new(xc, &ctx(None)).in_plugin_dir());
        assert!(PathEntry::new(xc, &new).in_plugin_dir());

        // The plugin directory itself is not inside a plugin directory
        assert!(!PathEntry::directory("Plugins/Lib.bundle", &new).in_plugin_dir());
    }

    #[test]
    fn test_synthesized_directories() {
        let files = ["a/b/c.txt", "a/b.meta", "a/d.txt", "z.txt"];
        let set = EntrySet::synthesize(&files, &ctx(None));
        let paths: Vec<&str> = set.iter().map(PathEntry::path).collect();
        assert_eq!(
            paths,
            ["a", "a/b", "a/b.meta", "a/b/c.txt", "a/d.txt", "z.txt"]
        );
        assert!(set.get("a/b").unwrap().is_directory());
        assert!(!set.get("a/b.meta").unwrap().is_directory());
        assert!(set.get("a/b/c").is_none());
        assert_eq!(set.len(), 6);
    }
}
