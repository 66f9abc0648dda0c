//! Strict JSON reader
//!
//! A recursive-descent parser over raw bytes. Beyond the JSON grammar it
//! rejects leading zeros, malformed decimals, literal control characters,
//! invalid Unicode, duplicate keys and a byte-order mark. Each of those rules
//! can be relaxed individually through [`JsonOptions`] so content published
//! before a rule existed can still be read. Errors carry the jq path of the
//! node being read.

use crate::tree::{format_path, Builder, Document, NodeId, Number, PathKey, Value};
use pkgcheck_errors::{JsonError, JsonErrorKind};
use std::collections::HashMap;

/// Maximum nesting of arrays and objects
pub const MAX_DEPTH: usize = 512;

/// Per-rule switches for the reader; every `allow_*` flag relaxes one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct JsonOptions {
    pub allow_leading_zeros: bool,
    pub allow_malformed_decimals: bool,
    pub allow_control_characters: bool,
    pub allow_invalid_unicode: bool,
    pub allow_duplicate_keys: bool,
    pub allow_byte_order_mark: bool,
}

impl JsonOptions {
    /// Every rule enforced
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            allow_leading_zeros: false,
            allow_malformed_decimals: false,
            allow_control_characters: false,
            allow_invalid_unicode: false,
            allow_duplicate_keys: false,
            allow_byte_order_mark: false,
        }
    }

    /// Every rule relaxed; invalid byte sequences become U+FFFD and the last
    /// of several duplicate keys wins
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            allow_leading_zeros: true,
            allow_malformed_decimals: true,
            allow_control_characters: true,
            allow_invalid_unicode: true,
            allow_duplicate_keys: true,
            allow_byte_order_mark: true,
        }
    }
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Parse with every rule enforced
///
/// # Errors
/// Returns a located [`JsonError`] for any grammar or rule violation.
pub fn parse(bytes: &[u8]) -> Result<Document, JsonError> {
    parse_with(bytes, JsonOptions::strict())
}

/// Parse with the given rule set
///
/// # Errors
/// Returns a located [`JsonError`] for any grammar or enabled rule violation.
pub fn parse_with(bytes: &[u8], options: JsonOptions) -> Result<Document, JsonError> {
    let mut parser = Parser {
        bytes,
        pos: 0,
        options,
        path: Vec::new(),
        builder: Builder::default(),
    };
    parser.parse_document()
}

struct Parser<'b> {
    bytes: &'b [u8],
    pos: usize,
    options: JsonOptions,
    path: Vec<PathKey>,
    builder: Builder,
}

impl Parser<'_> {
    fn parse_document(&mut self) -> Result<Document, JsonError> {
        if self.bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            if !self.options.allow_byte_order_mark {
                return Err(self.error(JsonErrorKind::ByteOrderMark));
            }
            self.pos = 3;
        }
        self.skip_whitespace();
        let root = self.parse_value(None, None, 0)?;
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            self.path.clear();
            return Err(self.error(JsonErrorKind::TrailingContent));
        }
        let builder = std::mem::take(&mut self.builder);
        Ok(builder.finish(root))
    }

    fn error(&self, kind: JsonErrorKind) -> JsonError {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: JsonErrorKind, offset: usize) -> JsonError {
        JsonError {
            kind,
            path: format_path(&self.path),
            offset,
        }
    }

    fn unexpected(&self, expected: &str) -> JsonError {
        match self.peek() {
            None => self.error(JsonErrorKind::UnexpectedEnd),
            Some(b) => self.error(JsonErrorKind::Unexpected {
                found: describe(b),
                expected: expected.to_string(),
            }),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, expected: &str) -> Result<(), JsonError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_value(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
        depth: usize,
    ) -> Result<NodeId, JsonError> {
        match self.peek() {
            Some(b'{') => self.parse_object(parent, key, depth + 1),
            Some(b'[') => self.parse_array(parent, key, depth + 1),
            Some(b'"') => {
                self.pos += 1;
                let s = self.parse_string()?;
                Ok(self.builder.push(Value::String(s), parent, key))
            }
            Some(b't') => self.parse_literal(b"true", Value::Bool(true), parent, key),
            Some(b'f') => self.parse_literal(b"false", Value::Bool(false), parent, key),
            Some(b'n') => self.parse_literal(b"null", Value::Null, parent, key),
            Some(b'-' | b'0'..=b'9') => {
                let n = self.parse_number()?;
                Ok(self.builder.push(Value::Number(n), parent, key))
            }
            Some(b'.') if self.options.allow_malformed_decimals => {
                let n = self.parse_number()?;
                Ok(self.builder.push(Value::Number(n), parent, key))
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_literal(
        &mut self,
        literal: &[u8],
        value: Value,
        parent: Option<NodeId>,
        key: Option<PathKey>,
    ) -> Result<NodeId, JsonError> {
        if self.bytes[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(self.builder.push(value, parent, key))
        } else {
            Err(self.unexpected("a value"))
        }
    }

    fn parse_object(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
        depth: usize,
    ) -> Result<NodeId, JsonError> {
        if depth > MAX_DEPTH {
            return Err(self.error(JsonErrorKind::TooDeep { limit: MAX_DEPTH }));
        }
        self.pos += 1;
        let id = self.builder.push(Value::Object(Vec::new()), parent, key);
        let mut members: Vec<(String, NodeId)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(id);
        }

        loop {
            self.skip_whitespace();
            let key_offset = self.pos;
            self.expect(b'"', "a string key")?;
            let name = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':', "':'")?;
            self.skip_whitespace();

            self.path.push(PathKey::Key(name.clone()));
            let existing = index.get(&name).copied();
            if existing.is_some() && !self.options.allow_duplicate_keys {
                return Err(self.error_at(JsonErrorKind::DuplicateKey { key: name }, key_offset));
            }
            let child = self.parse_value(Some(id), Some(PathKey::Key(name.clone())), depth)?;
            self.path.pop();

            match existing {
                Some(slot) => members[slot].1 = child,
                None => {
                    index.insert(name.clone(), members.len());
                    members.push((name, child));
                }
            }

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }

        self.builder.fill(id, Value::Object(members));
        Ok(id)
    }

    fn parse_array(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
        depth: usize,
    ) -> Result<NodeId, JsonError> {
        if depth > MAX_DEPTH {
            return Err(self.error(JsonErrorKind::TooDeep { limit: MAX_DEPTH }));
        }
        self.pos += 1;
        let id = self.builder.push(Value::Array(Vec::new()), parent, key);
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(id);
        }

        loop {
            self.skip_whitespace();
            let index = items.len();
            self.path.push(PathKey::Index(index));
            let child = self.parse_value(Some(id), Some(PathKey::Index(index)), depth)?;
            self.path.pop();
            items.push(child);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }

        self.builder.fill(id, Value::Array(items));
        Ok(id)
    }

    /// Reads string content after the opening quote, consuming the closing one
    fn parse_string(&mut self) -> Result<String, JsonError> {
        let mut out = String::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.error(JsonErrorKind::UnexpectedEnd));
            };
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => self.parse_escape(&mut out)?,
                0x00..=0x1F => {
                    if !self.options.allow_control_characters {
                        return Err(self.error(JsonErrorKind::ControlCharacter {
                            code: u32::from(b),
                        }));
                    }
                    out.push(char::from(b));
                    self.pos += 1;
                }
                0x20..=0x7F => {
                    out.push(char::from(b));
                    self.pos += 1;
                }
                _ => self.parse_utf8(&mut out)?,
            }
        }
    }

    fn parse_utf8(&mut self, out: &mut String) -> Result<(), JsonError> {
        let lead = self.bytes[self.pos];
        let width = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 0,
        };
        let decoded = (width > 0)
            .then(|| self.bytes.get(self.pos..self.pos + width))
            .flatten()
            .and_then(|chunk| std::str::from_utf8(chunk).ok());
        match decoded {
            Some(s) => {
                out.push_str(s);
                self.pos += width;
                Ok(())
            }
            None if self.options.allow_invalid_unicode => {
                out.push(char::REPLACEMENT_CHARACTER);
                self.pos += 1;
                Ok(())
            }
            None => Err(self.error(JsonErrorKind::InvalidUnicode {
                detail: format!("invalid UTF-8 sequence starting with byte {lead:#04x}"),
            })),
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), JsonError> {
        let start = self.pos;
        self.pos += 1;
        let Some(b) = self.peek() else {
            return Err(self.error(JsonErrorKind::UnexpectedEnd));
        };
        self.pos += 1;
        let c = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.parse_unicode_escape(start, out),
            _ => {
                let sequence = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                return Err(self.error_at(JsonErrorKind::InvalidEscape { sequence }, start));
            }
        };
        out.push(c);
        Ok(())
    }

    fn read_hex4(&mut self, escape_start: usize) -> Result<u32, JsonError> {
        let Some(digits) = self.bytes.get(self.pos..self.pos + 4) else {
            return Err(self.error(JsonErrorKind::UnexpectedEnd));
        };
        let parsed = std::str::from_utf8(digits)
            .ok()
            .filter(|s| s.bytes().all(|d| d.is_ascii_hexdigit()))
            .and_then(|s| u32::from_str_radix(s, 16).ok());
        match parsed {
            Some(v) => {
                self.pos += 4;
                Ok(v)
            }
            None => {
                let end = (self.pos + 4).min(self.bytes.len());
                let sequence = String::from_utf8_lossy(&self.bytes[escape_start..end]).into_owned();
                Err(self.error_at(JsonErrorKind::InvalidEscape { sequence }, escape_start))
            }
        }
    }

    fn parse_unicode_escape(&mut self, start: usize, out: &mut String) -> Result<(), JsonError> {
        let unit = self.read_hex4(start)?;
        let scalar = match unit {
            0xD800..=0xDBFF => {
                if self.bytes[self.pos..].starts_with(b"\\u") {
                    let resume = self.pos;
                    self.pos += 2;
                    let low = self.read_hex4(resume)?;
                    if (0xDC00..=0xDFFF).contains(&low) {
                        Some(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                    } else {
                        // Not a pair: leave the second escape to be read on its own
                        self.pos = resume;
                        None
                    }
                } else {
                    None
                }
            }
            0xDC00..=0xDFFF => None,
            v => Some(v),
        };
        match scalar.and_then(char::from_u32) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None if self.options.allow_invalid_unicode => {
                out.push(char::REPLACEMENT_CHARACTER);
                Ok(())
            }
            None => Err(self.error_at(
                JsonErrorKind::InvalidUnicode {
                    detail: format!("unpaired surrogate \\u{unit:04X}"),
                },
                start,
            )),
        }
    }

    fn parse_number(&mut self) -> Result<Number, JsonError> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let int_start = self.pos;
        self.consume_digits();
        let int_digits = &self.bytes[int_start..self.pos];
        if int_digits.len() > 1 && int_digits[0] == b'0' && !self.options.allow_leading_zeros {
            return Err(self.error_at(JsonErrorKind::LeadingZero, start));
        }
        let mut malformed = int_digits.is_empty();
        if malformed && self.peek() != Some(b'.') {
            return Err(self.malformed(start));
        }

        let mut is_float = false;
        let mut frac_digits: &[u8] = &[];
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            let frac_start = self.pos;
            self.consume_digits();
            frac_digits = &self.bytes[frac_start..self.pos];
            malformed |= frac_digits.is_empty();
        }
        if malformed && !self.options.allow_malformed_decimals {
            return Err(self.malformed(start));
        }

        let mut exponent: &[u8] = &[];
        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            let exp_start = self.pos;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            let digits_start = self.pos;
            self.consume_digits();
            if self.pos == digits_start {
                return Err(self.malformed(start));
            }
            exponent = &self.bytes[exp_start..self.pos];
        }

        // Rebuild a canonical literal so the lenient spellings parse too.
        let mut literal = String::new();
        if negative {
            literal.push('-');
        }
        literal.push_str(if int_digits.is_empty() {
            "0"
        } else {
            std::str::from_utf8(int_digits).unwrap_or("0")
        });
        if !is_float {
            if let Ok(i) = literal.parse::<i64>() {
                return Ok(Number::Int(i));
            }
        }
        literal.push('.');
        literal.push_str(if frac_digits.is_empty() {
            "0"
        } else {
            std::str::from_utf8(frac_digits).unwrap_or("0")
        });
        literal.push_str(std::str::from_utf8(exponent).unwrap_or(""));
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| self.malformed(start))
    }

    fn consume_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn malformed(&self, start: usize) -> JsonError {
        let literal = String::from_utf8_lossy(&self.bytes[start..self.pos.max(start)]).into_owned();
        self.error_at(JsonErrorKind::MalformedNumber { literal }, start)
    }
}

fn describe(b: u8) -> String {
    if b.is_ascii_graphic() {
        format!("character '{}'", char::from(b))
    } else {
        format!("byte {b:#04x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn strict_err(input: &[u8]) -> JsonError {
        parse(input).unwrap_err()
    }

    #[test]
    fn test_parses_nested_document() {
        let doc = parse(br#"{"name":"com.example.pkg","n":[1,-2.5e3,true,null],"o":{}}"#).unwrap();
        let root = doc.root();
        assert_eq!(root.get("name").as_str().unwrap(), "com.example.pkg");
        let n = root.get("n").as_array().unwrap();
        assert_eq!(n[0].as_number().unwrap(), Number::Int(1));
        assert_eq!(n[1].as_number().unwrap(), Number::Float(-2500.0));
        assert!(n[2].as_bool().unwrap());
        assert!(n[3].is_null());
        assert_eq!(root.get("o").kind(), NodeKind::Object);
    }

    #[test]
    fn test_control_character_strict_vs_legacy() {
        let input = b"{\"a\":{\"b\":[\"ok\",\"bad\nline\"]}}";
        let err = strict_err(input);
        assert_eq!(err.kind, JsonErrorKind::ControlCharacter { code: 0x0a });
        assert_eq!(err.path, ".a.b[1]");

        let doc = parse_with(input, JsonOptions::legacy()).unwrap();
        assert_eq!(
            doc.root().get("a").get("b").at(1).as_str().unwrap(),
            "bad\nline"
        );
    }

    #[test]
    fn test_leading_zero() {
        let err = strict_err(br#"{"v": 01}"#);
        assert_eq!(err.kind, JsonErrorKind::LeadingZero);
        assert_eq!(err.path, ".v");
        let doc = parse_with(br#"{"v": 01}"#, JsonOptions::legacy()).unwrap();
        assert_eq!(doc.root().get("v").as_number().unwrap(), Number::Int(1));
    }

    #[test]
    fn test_single_zero_and_negative_zero_are_fine() {
        let doc = parse(b"[0, -0, 0.5, -0.5e-3]").unwrap();
        assert_eq!(doc.root().at(0).as_number().unwrap(), Number::Int(0));
        assert_eq!(doc.root().at(2).as_number().unwrap(), Number::Float(0.5));
    }

    #[test]
    fn test_malformed_decimals() {
        for input in [&b"[1.]"[..], b"[.5]", b"[1.e3]", b"[-.5]"] {
            let err = strict_err(input);
            assert!(
                matches!(err.kind, JsonErrorKind::MalformedNumber { .. } | JsonErrorKind::Unexpected { .. }),
                "{err}"
            );
            assert_eq!(err.path, "[0]");
        }
        let doc = parse_with(b"[1., .5, 1.e3]", JsonOptions::legacy()).unwrap();
        assert_eq!(doc.root().at(0).as_number().unwrap(), Number::Float(1.0));
        assert_eq!(doc.root().at(1).as_number().unwrap(), Number::Float(0.5));
        assert_eq!(doc.root().at(2).as_number().unwrap(), Number::Float(1000.0));
    }

    #[test]
    fn test_exponent_requires_digits_in_every_mode() {
        assert!(parse_with(b"[1e]", JsonOptions::legacy()).is_err());
        assert!(parse_with(b"[-]", JsonOptions::legacy()).is_err());
    }

    #[test]
    fn test_duplicate_keys() {
        let err = strict_err(br#"{"a":{"x":1,"x":2}}"#);
        assert_eq!(
            err.kind,
            JsonErrorKind::DuplicateKey { key: "x".into() }
        );
        assert_eq!(err.path, ".a.x");

        let doc = parse_with(br#"{"x":1,"y":0,"x":2}"#, JsonOptions::legacy()).unwrap();
        let members = doc.root().as_object().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].0, "x");
        assert_eq!(members[0].1.as_number().unwrap(), Number::Int(2));
    }

    #[test]
    fn test_invalid_utf8() {
        let input = b"{\"k\":\"a\xffb\"}";
        let err = strict_err(input);
        assert!(matches!(err.kind, JsonErrorKind::InvalidUnicode { .. }));
        assert_eq!(err.path, ".k");
        assert_eq!(err.offset, 7);

        let doc = parse_with(input, JsonOptions::legacy()).unwrap();
        assert_eq!(doc.root().get("k").as_str().unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_surrogates() {
        let doc = parse(br#""\ud83d\ude00""#).unwrap();
        assert_eq!(doc.root().as_str().unwrap(), "\u{1F600}");

        let err = strict_err(br#"["\ud800x"]"#);
        assert!(matches!(err.kind, JsonErrorKind::InvalidUnicode { .. }));
        assert_eq!(err.path, "[0]");

        let doc = parse_with(br#""\udc00A""#, JsonOptions::legacy()).unwrap();
        assert_eq!(doc.root().as_str().unwrap(), "\u{FFFD}A");

        let doc = parse_with(br#""\ud800A""#, JsonOptions::legacy()).unwrap();
        assert_eq!(doc.root().as_str().unwrap(), "\u{FFFD}A");
    }

    #[test]
    fn test_escapes() {
        let doc = parse(br#""\"\\\/\b\f\n\r\t\u00e9""#).unwrap();
        assert_eq!(doc.root().as_str().unwrap(), "\"\\/\u{8}\u{c}\n\r\t\u{e9}");
        let err = strict_err(br#"{"a":"\q"}"#);
        assert_eq!(
            err.kind,
            JsonErrorKind::InvalidEscape {
                sequence: "\\q".into()
            }
        );
    }

    #[test]
    fn test_byte_order_mark() {
        let input = b"\xEF\xBB\xBF{}";
        assert_eq!(strict_err(input).kind, JsonErrorKind::ByteOrderMark);
        assert!(parse_with(input, JsonOptions::legacy()).is_ok());
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(strict_err(b"").kind, JsonErrorKind::UnexpectedEnd);
        assert_eq!(strict_err(b"{} x").kind, JsonErrorKind::TrailingContent);
        assert!(matches!(
            strict_err(b"[1,]").kind,
            JsonErrorKind::Unexpected { .. }
        ));
        assert!(matches!(
            strict_err(br#"{"a" 1}"#).kind,
            JsonErrorKind::Unexpected { .. }
        ));
        assert!(matches!(strict_err(b"tru").kind, JsonErrorKind::Unexpected { .. }));
        assert_eq!(strict_err(br#"{"a":"x"#).kind, JsonErrorKind::UnexpectedEnd);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert_eq!(
            strict_err(deep.as_bytes()).kind,
            JsonErrorKind::TooDeep { limit: MAX_DEPTH }
        );
        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse(ok.as_bytes()).is_ok());
    }

    #[test]
    fn test_big_integers_fall_back_to_float() {
        let doc = parse(b"123456789012345678901234567890").unwrap();
        assert!(matches!(doc.root().as_number().unwrap(), Number::Float(_)));
    }
}
