//! Package sources
//!
//! A package is an ordered, duplicate-free list of relative `/`-separated
//! file paths plus a way to read each one. Sources are immutable for the
//! duration of a run.

use pkgcheck_errors::PackageError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read access to the files of one package
pub trait PackageSource {
    /// Every file path, sorted, without directories
    fn files(&self) -> &[String];

    /// Whole content of a file
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not in the package or cannot be read.
    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError>;

    /// Streaming access to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not in the package or cannot be opened.
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, PackageError>;

    /// Size of a file in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not in the package or its metadata
    /// cannot be read.
    fn size(&self, path: &str) -> Result<u64, PackageError>;

    /// Up to `len` leading bytes of a file
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not in the package or cannot be read.
    fn read_prefix(&self, path: &str, len: usize) -> Result<Vec<u8>, PackageError> {
        let mut prefix = Vec::with_capacity(len);
        self.open(path)?
            .take(len as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| read_failed(path, &e))?;
        Ok(prefix)
    }

    fn contains(&self, path: &str) -> bool {
        self.files()
            .binary_search_by(|p| p.as_str().cmp(path))
            .is_ok()
    }
}

fn read_failed(path: &str, err: &io::Error) -> PackageError {
    PackageError::ReadFailed {
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn not_found(path: &str) -> PackageError {
    PackageError::FileNotFound {
        path: path.to_string(),
    }
}

/// Reject paths that cannot name a file inside a package
///
/// # Errors
///
/// Returns `PackageError::InvalidPath` naming the problem.
pub fn validate_path(path: &str) -> Result<(), PackageError> {
    let invalid = |reason: &str| {
        Err(PackageError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };
    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.starts_with('/') {
        return invalid("path must be relative");
    }
    if path.contains('\\') {
        return invalid("path must use '/' separators");
    }
    for component in path.split('/') {
        match component {
            "" => return invalid("empty path component"),
            "." | ".." => return invalid("relative path component"),
            _ => {}
        }
    }
    Ok(())
}

/// A package laid out in a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryPackage {
    root: PathBuf,
    files: Vec<String>,
}

impl DirectoryPackage {
    /// Walk `root` and list every regular file beneath it
    ///
    /// Symbolic links are followed and listed under their own path.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory, the walk fails (which
    /// includes dangling links and link cycles), or a path is not valid UTF-8.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PackageError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PackageError::RootNotFound {
                path: root.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true).min_depth(1) {
            let entry = entry.map_err(|e| PackageError::ReadFailed {
                path: e
                    .path()
                    .map_or_else(|| root.display().to_string(), |p| p.display().to_string()),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = relative_path(&root, entry.path())?;
            if entry.path_is_symlink() {
                tracing::debug!(path = %path, "listing linked file");
            }
            files.push(path);
        }
        files.sort();

        tracing::debug!(root = %root.display(), files = files.len(), "listed package");
        Ok(Self { root, files })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, PackageError> {
        if !self.contains(path) {
            return Err(not_found(path));
        }
        Ok(path.split('/').fold(self.root.clone(), |acc, c| acc.join(c)))
    }
}

fn relative_path(root: &Path, path: &Path) -> Result<String, PackageError> {
    let relative = path.strip_prefix(root).map_err(|_| PackageError::InvalidPath {
        path: path.display().to_string(),
        reason: "outside the package root".to_string(),
    })?;
    let mut components = Vec::new();
    for component in relative.components() {
        let text = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| PackageError::InvalidPath {
                path: relative.display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })?;
        components.push(text);
    }
    Ok(components.join("/"))
}

impl PackageSource for DirectoryPackage {
    fn files(&self) -> &[String] {
        &self.files
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError> {
        let full = self.resolve(path)?;
        std::fs::read(full).map_err(|e| read_failed(path, &e))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, PackageError> {
        let full = self.resolve(path)?;
        let file = File::open(full).map_err(|e| read_failed(path, &e))?;
        Ok(Box::new(file))
    }

    fn size(&self, path: &str) -> Result<u64, PackageError> {
        let full = self.resolve(path)?;
        std::fs::metadata(full)
            .map(|m| m.len())
            .map_err(|e| read_failed(path, &e))
    }
}

/// A package held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    contents: BTreeMap<String, Vec<u8>>,
    files: Vec<String>,
}

impl MemoryPackage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a package from `(path, content)` pairs
    ///
    /// # Errors
    ///
    /// Returns an error if a path is invalid or listed twice.
    pub fn from_files<I, P, C>(files: I) -> Result<Self, PackageError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut package = Self::new();
        for (path, content) in files {
            package.insert(path, content)?;
        }
        Ok(package)
    }

    /// Add one file
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or already present.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), PackageError> {
        let path = path.into();
        validate_path(&path)?;
        if self.contents.contains_key(&path) {
            return Err(PackageError::DuplicatePath { path });
        }
        self.contents.insert(path, content.into());
        self.files = self.contents.keys().cloned().collect();
        Ok(())
    }

    fn get(&self, path: &str) -> Result<&[u8], PackageError> {
        self.contents
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| not_found(path))
    }
}

impl PackageSource for MemoryPackage {
    fn files(&self) -> &[String] {
        &self.files
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, PackageError> {
        self.get(path).map(<[u8]>::to_vec)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, PackageError> {
        Ok(Box::new(Cursor::new(self.get(path)?)))
    }

    fn size(&self, path: &str) -> Result<u64, PackageError> {
        Ok(self.get(path)?.len() as u64)
    }

    fn read_prefix(&self, path: &str, len: usize) -> Result<Vec<u8>, PackageError> {
        let content = self.get(path)?;
        Ok(content[..content.len().min(len)].to_vec())
    }

    fn contains(&self, path: &str) -> bool {
        self.contents.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("Runtime/a.cs").is_ok());
        assert!(validate_path(".hidden").is_ok());
        for bad in ["", "/abs", "a//b", "a/../b", "./a", "a\\b", "a/"] {
            assert!(
                matches!(validate_path(bad), Err(PackageError::InvalidPath { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_memory_package_sorted_and_unique() {
        let package =
            MemoryPackage::from_files([("b.txt", "b"), ("a/c.txt", "c"), ("a.txt", "a")]).unwrap();
        assert_eq!(package.files(), ["a.txt", "a/c.txt", "b.txt"]);
        assert!(package.contains("a/c.txt"));
        assert!(!package.contains("a"));

        let err = MemoryPackage::from_files([("a.txt", "1"), ("a.txt", "2")]).unwrap_err();
        assert!(matches!(err, PackageError::DuplicatePath { .. }));
    }

    #[test]
    fn test_memory_package_reads() {
        let package = MemoryPackage::from_files([("data.bin", vec![1u8, 2, 3, 4])]).unwrap();
        assert_eq!(package.size("data.bin").unwrap(), 4);
        assert_eq!(package.read_prefix("data.bin", 2).unwrap(), [1, 2]);
        assert_eq!(package.read_prefix("data.bin", 10).unwrap(), [1, 2, 3, 4]);
        let mut streamed = Vec::new();
        package
            .open("data.bin")
            .unwrap()
            .read_to_end(&mut streamed)
            .unwrap();
        assert_eq!(streamed, [1, 2, 3, 4]);
        assert!(matches!(
            package.read("missing"),
            Err(PackageError::FileNotFound { .. })
        ));
    }
}
