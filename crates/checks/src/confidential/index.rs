//! Confidential-content index blob
//!
//! Layout, little-endian:
//!
//! ```text
//! magic  u32          0x3158_4943 ("CIX1")
//! count  u32          N
//! N x u64             prefix hashes, sorted ascending
//! N x u64             full hashes
//! N x u32             minimum filtered sizes
//! trailer             UTF-8 JSON rules
//! ```
//!
//! The blob is parsed once into typed sections; every section length is
//! checked before anything is read.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use pkgcheck_errors::BaselineError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

pub const MAGIC: u32 = 0x3158_4943;

const HEADER_LEN: usize = 8;
const ENTRY_LEN: usize = 8 + 8 + 4;

#[derive(Debug, Default, Deserialize)]
struct Trailer {
    #[serde(default)]
    path_patterns: Vec<String>,
    #[serde(default)]
    content_ignore_patterns: Vec<String>,
    #[serde(default)]
    content_rules: Vec<RawContentRule>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawContentRule {
    paths: Vec<String>,
    regex: String,
}

/// Glob patterns over package paths
///
/// A pattern without `/` matches the lowercase file name; a pattern with `/`
/// matches the whole lowercase path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    names: GlobSet,
    paths: GlobSet,
}

impl PathMatcher {
    /// Compile a list of patterns
    ///
    /// # Errors
    ///
    /// Returns `BaselineError::InvalidPattern` for a pattern that is not a glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, BaselineError> {
        let mut names = GlobSetBuilder::new();
        let mut paths = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(&pattern.to_lowercase())
                .literal_separator(true)
                .build()
                .map_err(|e| invalid_pattern(pattern, &e))?;
            if pattern.contains('/') {
                paths.add(glob);
            } else {
                names.add(glob);
            }
        }
        Ok(Self {
            names: names.build().map_err(|e| invalid_pattern("", &e))?,
            paths: paths.build().map_err(|e| invalid_pattern("", &e))?,
        })
    }

    #[must_use]
    pub fn is_match(&self, lower_path: &str, lower_name: &str) -> bool {
        self.names.is_match(lower_name) || self.paths.is_match(lower_path)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.paths.is_empty()
    }
}

fn invalid_pattern(pattern: &str, err: &impl std::fmt::Display) -> BaselineError {
    BaselineError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    }
}

/// A content regex applied to the files its path patterns select
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub paths: PathMatcher,
    pub regex: Regex,
}

/// Parsed index
#[derive(Debug, Clone)]
pub struct ConfidentialIndex {
    prefix_hashes: Vec<u64>,
    full_hashes: Vec<u64>,
    min_sizes: Vec<u32>,
    pub path_patterns: PathMatcher,
    pub content_ignore: PathMatcher,
    pub content_rules: Vec<ContentRule>,
    /// Case-insensitive, word-bounded alternation of every keyword
    pub keywords: Option<Regex>,
}

/// One hash entry whose prefix matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub full_hash: u64,
    pub min_size: u32,
}

impl ConfidentialIndex {
    /// Parse and validate a blob
    ///
    /// # Errors
    ///
    /// Returns a `BaselineError` describing the first structural problem.
    pub fn parse(blob: &[u8]) -> Result<Self, BaselineError> {
        if blob.len() < HEADER_LEN {
            return Err(BaselineError::Truncated {
                len: blob.len(),
                needed: HEADER_LEN,
            });
        }
        let magic = read_u32(&blob[0..4]);
        if magic != MAGIC {
            return Err(BaselineError::BadMagic { found: magic });
        }
        let count = read_u32(&blob[4..8]) as usize;
        let needed = count
            .checked_mul(ENTRY_LEN)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or(BaselineError::Truncated {
                len: blob.len(),
                needed: usize::MAX,
            })?;
        if blob.len() < needed {
            return Err(BaselineError::Truncated {
                len: blob.len(),
                needed,
            });
        }

        let prefix_end = HEADER_LEN + count * 8;
        let full_end = prefix_end + count * 8;
        let prefix_hashes: Vec<u64> = blob[HEADER_LEN..prefix_end]
            .chunks_exact(8)
            .map(read_u64)
            .collect();
        let full_hashes: Vec<u64> = blob[prefix_end..full_end]
            .chunks_exact(8)
            .map(read_u64)
            .collect();
        let min_sizes: Vec<u32> = blob[full_end..needed]
            .chunks_exact(4)
            .map(read_u32)
            .collect();

        if let Some(index) = prefix_hashes.windows(2).position(|w| w[0] > w[1]) {
            return Err(BaselineError::Unsorted { index: index + 1 });
        }

        let trailer = std::str::from_utf8(&blob[needed..]).map_err(|e| {
            BaselineError::InvalidTrailer {
                message: e.to_string(),
            }
        })?;
        let trailer: Trailer = if trailer.trim().is_empty() {
            Trailer::default()
        } else {
            serde_json::from_str(trailer).map_err(|e| BaselineError::InvalidTrailer {
                message: e.to_string(),
            })?
        };

        let content_rules = trailer
            .content_rules
            .iter()
            .map(|rule| {
                Ok(ContentRule {
                    paths: PathMatcher::new(&rule.paths)?,
                    regex: Regex::new(&rule.regex).map_err(|e| invalid_pattern(&rule.regex, &e))?,
                })
            })
            .collect::<Result<Vec<_>, BaselineError>>()?;

        Ok(Self {
            prefix_hashes,
            full_hashes,
            min_sizes,
            path_patterns: PathMatcher::new(&trailer.path_patterns)?,
            content_ignore: PathMatcher::new(&trailer.content_ignore_patterns)?,
            content_rules,
            keywords: keyword_regex(&trailer.keywords)?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prefix_hashes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefix_hashes.is_empty()
    }

    /// Entries whose prefix hash equals `prefix`, in index order
    pub fn candidates(&self, prefix: u64) -> impl Iterator<Item = Candidate> + '_ {
        let start = self.prefix_hashes.partition_point(|&h| h < prefix);
        self.prefix_hashes[start..]
            .iter()
            .take_while(move |&&h| h == prefix)
            .enumerate()
            .map(move |(offset, _)| Candidate {
                full_hash: self.full_hashes[start + offset],
                min_size: self.min_sizes[start + offset],
            })
    }
}

fn keyword_regex(keywords: &[String]) -> Result<Option<Regex>, BaselineError> {
    let words: Vec<String> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| regex::escape(k))
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"\b(?:{})\b", words.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| invalid_pattern(&pattern, &e))
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Serialize an index blob
///
/// Entries are `(prefix hash, full hash, min size)` and are sorted by prefix
/// hash before writing.
#[must_use]
pub fn encode(entries: &[(u64, u64, u32)], trailer: &str) -> Vec<u8> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.0);
    let mut blob = Vec::with_capacity(HEADER_LEN + sorted.len() * ENTRY_LEN + trailer.len());
    blob.extend_from_slice(&MAGIC.to_le_bytes());
    blob.extend_from_slice(&u32::try_from(sorted.len()).unwrap_or(u32::MAX).to_le_bytes());
    for (prefix, _, _) in &sorted {
        blob.extend_from_slice(&prefix.to_le_bytes());
    }
    for (_, full, _) in &sorted {
        blob.extend_from_slice(&full.to_le_bytes());
    }
    for (_, _, size) in &sorted {
        blob.extend_from_slice(&size.to_le_bytes());
    }
    blob.extend_from_slice(trailer.as_bytes());
    blob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_validation() {
        assert!(matches!(
            ConfidentialIndex::parse(b"CIX"),
            Err(BaselineError::Truncated { len: 3, needed: 8 })
        ));
        assert!(matches!(
            ConfidentialIndex::parse(b"XXXX\0\0\0\0"),
            Err(BaselineError::BadMagic { .. })
        ));

        let mut blob = encode(&[(1, 2, 3)], "");
        blob.truncate(20);
        assert!(matches!(
            ConfidentialIndex::parse(&blob),
            Err(BaselineError::Truncated { len: 20, needed: 28 })
        ));
    }

    #[test]
    fn test_unsorted_prefixes_rejected() {
        let mut blob = MAGIC.to_le_bytes().to_vec();
        blob.extend_from_slice(&2u32.to_le_bytes());
        blob.extend_from_slice(&9u64.to_le_bytes());
        blob.extend_from_slice(&3u64.to_le_bytes());
        blob.extend_from_slice(&[0u8; 16 + 8]);
        assert!(matches!(
            ConfidentialIndex::parse(&blob),
            Err(BaselineError::Unsorted { index: 1 })
        ));
    }

    #[test]
    fn test_trailer_validation() {
        let bad_json = encode(&[], "{not json");
        assert!(matches!(
            ConfidentialIndex::parse(&bad_json),
            Err(BaselineError::InvalidTrailer { .. })
        ));

        let bad_regex = encode(&[], r#"{"content_rules":[{"paths":["*.cs"],"regex":"("}]}"#);
        assert!(matches!(
            ConfidentialIndex::parse(&bad_regex),
            Err(BaselineError::InvalidPattern { .. })
        ));

        let bad_glob = encode(&[], r#"{"path_patterns":["a[b"]}"#);
        assert!(matches!(
            ConfidentialIndex::parse(&bad_glob),
            Err(BaselineError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_candidates_scan_equal_prefixes() {
        let index =
            ConfidentialIndex::parse(&encode(&[(7, 70, 1), (5, 50, 2), (7, 71, 3)], "")).unwrap();
        assert_eq!(index.len(), 3);
        let found: Vec<u64> = index.candidates(7).map(|c| c.full_hash).collect();
        assert_eq!(found, [70, 71]);
        assert_eq!(index.candidates(6).count(), 0);
        assert_eq!(index.candidates(99).count(), 0);
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathMatcher::new(&["*.PEM", "secrets/**", "docs/*.txt"]).unwrap();
        assert!(matcher.is_match("runtime/keys/server.pem", "server.pem"));
        assert!(matcher.is_match("secrets/a/b.txt", "b.txt"));
        assert!(matcher.is_match("docs/a.txt", "a.txt"));
        assert!(!matcher.is_match("docs/nested/a.txt", "a.txt"));
        assert!(!matcher.is_match("runtime/secrets/a.txt", "a.txt"));
    }

    #[test]
    fn test_keywords_are_word_bounded() {
        let index =
            ConfidentialIndex::parse(&encode(&[], r#"{"keywords":["Falcon","night-owl"]}"#)).unwrap();
        let keywords = index.keywords.unwrap();
        assert!(keywords.is_match("project FALCON ships"));
        assert!(!keywords.is_match("falconry"));
        assert!(keywords.is_match("the night-owl build"));
        assert!(!keywords.is_match("nightowl"));
    }
}
