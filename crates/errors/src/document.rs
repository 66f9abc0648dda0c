//! Document parsing and navigation error types
//!
//! JSON errors are located by the jq-style path of the offending node plus
//! the byte offset; YAML errors by 1-based line and column.

use std::fmt;

use thiserror::Error;

/// What went wrong while reading a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum JsonErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected {found}, expected {expected}")]
    Unexpected { found: String, expected: String },

    #[error("unexpected content after the top-level value")]
    TrailingContent,

    #[error("number has a leading zero")]
    LeadingZero,

    #[error("malformed number: {literal}")]
    MalformedNumber { literal: String },

    #[error("literal control character U+{code:04X} in string")]
    ControlCharacter { code: u32 },

    #[error("invalid escape sequence {sequence}")]
    InvalidEscape { sequence: String },

    #[error("invalid Unicode: {detail}")]
    InvalidUnicode { detail: String },

    #[error("duplicate key {key:?}")]
    DuplicateKey { key: String },

    #[error("byte order mark is not allowed")]
    ByteOrderMark,

    #[error("nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}

/// A located JSON parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind} (at byte {offset})")]
pub struct JsonError {
    pub kind: JsonErrorKind,
    /// jq-style path of the node being read when the error occurred
    pub path: String,
    pub offset: usize,
}

/// What went wrong while reading a restricted YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum YamlErrorKind {
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,

    #[error("tab characters are only allowed inside double-quoted scalars")]
    Tab,

    #[error("block scalars are not supported")]
    BlockScalar,

    #[error("anchors are not supported")]
    Anchor,

    #[error("aliases are not supported")]
    Alias,

    #[error("tags are not supported")]
    Tag,

    #[error("single-quoted scalars are not supported")]
    SingleQuoted,

    #[error("flow collections other than [] and {{}} are not supported")]
    FlowCollection,

    #[error("complex mapping keys are not supported")]
    ComplexKey,

    #[error("directives are not supported")]
    Directive,

    #[error("document markers are not supported")]
    DocumentMarker,

    #[error("reserved indicator {indicator:?} cannot start a plain scalar")]
    ReservedIndicator { indicator: char },

    #[error("literal {literal:?} has ambiguous capitalization")]
    AmbiguousLiteral { literal: String },

    #[error("duplicate key {key:?}")]
    DuplicateKey { key: String },

    #[error("mapping values are not allowed in this context")]
    MappingValueNotAllowed,

    #[error("expected a mapping key")]
    ExpectedKey,

    #[error("sequence entry not allowed here")]
    UnexpectedSequenceEntry,

    #[error("unexpected indentation")]
    UnexpectedIndentation,

    #[error("multi-line plain scalars are not supported")]
    MultiLineScalar,

    #[error("unterminated double-quoted scalar")]
    UnterminatedString,

    #[error("invalid escape sequence {sequence}")]
    InvalidEscape { sequence: String },

    #[error("unexpected content after scalar")]
    TrailingContent,

    #[error("nesting deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// A located YAML parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct YamlError {
    pub kind: YamlErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Errors produced while reading or navigating a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Json(#[from] JsonError),

    #[error("{0}")]
    Yaml(#[from] YamlError),

    #[error("{path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl DocumentError {
    /// Build a type mismatch from anything displayable
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
