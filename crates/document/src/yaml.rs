//! Restricted YAML reader
//!
//! Companion files are read with a deliberately small subset of YAML: block
//! mappings and sequences, single-line plain and double-quoted scalars, the
//! Core schema for untagged scalars, and the empty flow collections `[]` and
//! `{}`. Everything outside that subset is rejected with a located error so a
//! validated file can never be read differently by a fuller YAML loader.
//!
//! Reading happens in two steps. Each physical line is first cut into tokens
//! (sequence dashes and content), with comments and indentation removed and
//! line-level constructs such as directives rejected. The token stream is then
//! assembled into a tree using the token columns as the block structure.

use crate::json::MAX_DEPTH;
use crate::tree::{Builder, Document, NodeId, Number, PathKey, Value};
use pkgcheck_errors::{YamlError, YamlErrorKind};
use std::collections::HashSet;

/// Reader switches; `allow_invalid_utf8` replaces bad sequences with U+FFFD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YamlOptions {
    pub allow_invalid_utf8: bool,
}

impl YamlOptions {
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            allow_invalid_utf8: false,
        }
    }

    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            allow_invalid_utf8: true,
        }
    }
}

/// Parse with every rule enforced
///
/// # Errors
/// Returns a [`YamlError`] with a 1-based line and column for input outside
/// the supported subset.
pub fn parse(bytes: &[u8]) -> Result<Document, YamlError> {
    parse_with(bytes, YamlOptions::strict())
}

/// Parse with the given options
///
/// # Errors
/// Returns a [`YamlError`] with a 1-based line and column for input outside
/// the supported subset.
pub fn parse_with(bytes: &[u8], options: YamlOptions) -> Result<Document, YamlError> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(_) if options.allow_invalid_utf8 => String::from_utf8_lossy(bytes),
        Err(e) => {
            let (line, column) = locate(&bytes[..e.valid_up_to()]);
            return Err(YamlError {
                kind: YamlErrorKind::InvalidUtf8,
                line,
                column,
            });
        }
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut tokens = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let chars: Vec<char> = raw.chars().collect();
        lex_line(&chars, index + 1, &mut tokens)?;
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        builder: Builder::default(),
    };
    parser.parse_document()
}

/// Line and column just past the given prefix
fn locate(prefix: &[u8]) -> (usize, usize) {
    let text = String::from_utf8_lossy(prefix);
    let line = text.matches('\n').count() + 1;
    let column = text.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

fn err(kind: YamlErrorKind, line: usize, column: usize) -> YamlError {
    YamlError {
        kind,
        line,
        column: column + 1,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Dash,
    Content(String),
}

/// One lexical item; `column` is the 0-based character column
#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn lex_line(chars: &[char], line: usize, tokens: &mut Vec<Token>) -> Result<(), YamlError> {
    let len = chars.len();
    let Some(first) = chars.iter().position(|c| *c != ' ' && *c != '\t') else {
        return Ok(());
    };
    if chars[first] == '#' {
        return Ok(());
    }
    if let Some(tab) = chars[..first].iter().position(|c| *c == '\t') {
        return Err(err(YamlErrorKind::Tab, line, tab));
    }

    if first == 0 {
        let marker = len >= 3
            && (chars[..3] == ['-', '-', '-'] || chars[..3] == ['.', '.', '.'])
            && (len == 3 || chars[3] == ' ' || chars[3] == '\t');
        if marker {
            return Err(err(YamlErrorKind::DocumentMarker, line, 0));
        }
        if chars[0] == '%' {
            return Err(err(YamlErrorKind::Directive, line, 0));
        }
    }

    let mut i = first;
    while chars[i] == '-' && (i + 1 == len || chars[i + 1] == ' ' || chars[i + 1] == '\t') {
        tokens.push(Token {
            kind: TokenKind::Dash,
            line,
            column: i,
        });
        i += 1;
        while i < len && chars[i] == ' ' {
            i += 1;
        }
        if i < len && chars[i] == '\t' {
            return Err(err(YamlErrorKind::Tab, line, i));
        }
        if i == len || chars[i] == '#' {
            return Ok(());
        }
    }

    let start = i;
    let mut end = len;
    let mut scalar_start = true;
    let mut quote_open: Option<usize> = None;
    let mut j = start;
    while j < len {
        let c = chars[j];
        if quote_open.is_some() {
            match c {
                '\\' => j += 1,
                '"' => quote_open = None,
                _ => {}
            }
            j += 1;
            continue;
        }
        match c {
            '"' if scalar_start => {
                quote_open = Some(j);
                scalar_start = false;
            }
            '#' if j == start || chars[j - 1] == ' ' => {
                end = j;
                break;
            }
            '\t' => return Err(err(YamlErrorKind::Tab, line, j)),
            ':' if j + 1 == len || chars[j + 1] == ' ' => {
                scalar_start = true;
                j += 1;
                while j < len && chars[j] == ' ' {
                    j += 1;
                }
                continue;
            }
            ' ' => {}
            _ => scalar_start = false,
        }
        j += 1;
    }
    if let Some(open) = quote_open {
        return Err(err(YamlErrorKind::UnterminatedString, line, open));
    }

    let text: String = chars[start..end].iter().collect();
    tokens.push(Token {
        kind: TokenKind::Content(text.trim_end_matches(' ').to_string()),
        line,
        column: start,
    });
    Ok(())
}

/// A `key: value` line split into its parts; columns are 0-based
struct Entry {
    key: String,
    key_column: usize,
    value: Option<(String, usize)>,
}

fn split_entry(text: &str, line: usize, column: usize) -> Result<Option<Entry>, YamlError> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let is_break = |i: usize| i == len || chars[i] == ' ';

    let (key, colon) = if chars[0] == '"' {
        let (key, after) = read_quoted(&chars, line, column)?;
        let mut i = after;
        while i < len && chars[i] == ' ' {
            i += 1;
        }
        if i < len && chars[i] == ':' && is_break(i + 1) {
            (key, i)
        } else {
            return Ok(None);
        }
    } else {
        if chars[0] == '?' && is_break(1) {
            return Err(err(YamlErrorKind::ComplexKey, line, column));
        }
        let Some(i) = (0..len).find(|&i| chars[i] == ':' && is_break(i + 1)) else {
            return Ok(None);
        };
        let key: String = chars[..i].iter().collect();
        let key = key.trim_end_matches(' ').to_string();
        if key.is_empty() {
            return Err(err(YamlErrorKind::ExpectedKey, line, column));
        }
        if let Some(kind) = indicator_error(&chars) {
            return Err(err(kind, line, column));
        }
        (key, i)
    };

    let mut v = colon + 1;
    while v < len && chars[v] == ' ' {
        v += 1;
    }
    let value = (v < len).then(|| (chars[v..].iter().collect(), column + v));
    Ok(Some(Entry {
        key,
        key_column: column,
        value,
    }))
}

/// Rejections decided by the first characters of a plain scalar or key
fn indicator_error(chars: &[char]) -> Option<YamlErrorKind> {
    let spaced = chars.len() == 1 || chars[1] == ' ';
    match chars.first()? {
        '|' | '>' => Some(YamlErrorKind::BlockScalar),
        '&' => Some(YamlErrorKind::Anchor),
        '*' => Some(YamlErrorKind::Alias),
        '!' => Some(YamlErrorKind::Tag),
        '\'' => Some(YamlErrorKind::SingleQuoted),
        '[' | '{' | ']' | '}' | ',' => Some(YamlErrorKind::FlowCollection),
        '?' if spaced => Some(YamlErrorKind::ComplexKey),
        '-' if spaced => Some(YamlErrorKind::UnexpectedSequenceEntry),
        c @ ('@' | '`') => Some(YamlErrorKind::ReservedIndicator { indicator: *c }),
        _ => None,
    }
}

/// Reads a double-quoted scalar starting at `chars[0]`; returns the decoded
/// text and the index just past the closing quote
fn read_quoted(chars: &[char], line: usize, column: usize) -> Result<(String, usize), YamlError> {
    let mut out = String::new();
    let mut i = 1;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let escape_at = i;
                let Some(&code) = chars.get(i + 1) else {
                    break;
                };
                i += 2;
                let simple = match code {
                    '"' => Some('"'),
                    '\\' => Some('\\'),
                    '/' => Some('/'),
                    ' ' => Some(' '),
                    '0' => Some('\0'),
                    'a' => Some('\u{07}'),
                    'b' => Some('\u{08}'),
                    't' => Some('\t'),
                    'n' => Some('\n'),
                    'v' => Some('\u{0b}'),
                    'f' => Some('\u{0c}'),
                    'r' => Some('\r'),
                    'e' => Some('\u{1b}'),
                    'N' => Some('\u{85}'),
                    '_' => Some('\u{a0}'),
                    'L' => Some('\u{2028}'),
                    'P' => Some('\u{2029}'),
                    _ => None,
                };
                if let Some(c) = simple {
                    out.push(c);
                    continue;
                }
                let width = match code {
                    'x' => 2,
                    'u' => 4,
                    'U' => 8,
                    _ => 0,
                };
                let decoded = (width > 0)
                    .then(|| chars.get(i..i + width))
                    .flatten()
                    .filter(|digits| digits.iter().all(char::is_ascii_hexdigit))
                    .and_then(|digits| {
                        u32::from_str_radix(&digits.iter().collect::<String>(), 16).ok()
                    })
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => {
                        out.push(c);
                        i += width;
                    }
                    None => {
                        let end = (i + width).min(chars.len());
                        return Err(err(
                            YamlErrorKind::InvalidEscape {
                                sequence: chars[escape_at..end].iter().collect(),
                            },
                            line,
                            column + escape_at,
                        ));
                    }
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(err(YamlErrorKind::UnterminatedString, line, column))
}

/// Turn a value's source text into a tree value
fn scalar(text: &str, line: usize, column: usize) -> Result<Value, YamlError> {
    let chars: Vec<char> = text.chars().collect();
    if chars[0] == '"' {
        let (s, after) = read_quoted(&chars, line, column)?;
        if after != chars.len() {
            return Err(err(YamlErrorKind::TrailingContent, line, column + after));
        }
        return Ok(Value::String(s));
    }

    let inner_empty = |close: char| {
        chars.len() >= 2
            && chars[chars.len() - 1] == close
            && chars[1..chars.len() - 1].iter().all(|c| *c == ' ')
    };
    if chars[0] == '[' && inner_empty(']') {
        return Ok(Value::Array(Vec::new()));
    }
    if chars[0] == '{' && inner_empty('}') {
        return Ok(Value::Object(Vec::new()));
    }
    if let Some(kind) = indicator_error(&chars) {
        return Err(err(kind, line, column));
    }
    if let Some(colon) = (0..chars.len())
        .find(|&i| chars[i] == ':' && (i + 1 == chars.len() || chars[i + 1] == ' '))
    {
        return Err(err(YamlErrorKind::MappingValueNotAllowed, line, column + colon));
    }
    resolve(text).map_err(|kind| err(kind, line, column))
}

/// Core schema resolution of an untagged plain scalar
fn resolve(text: &str) -> Result<Value, YamlErrorKind> {
    match text {
        "~" | "null" | "Null" | "NULL" => return Ok(Value::Null),
        "true" | "True" | "TRUE" => return Ok(Value::Bool(true)),
        "false" | "False" | "FALSE" => return Ok(Value::Bool(false)),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Ok(Value::Number(Number::Float(f64::INFINITY)));
        }
        "-.inf" | "-.Inf" | "-.INF" => {
            return Ok(Value::Number(Number::Float(f64::NEG_INFINITY)));
        }
        ".nan" | ".NaN" | ".NAN" => return Ok(Value::Number(Number::Float(f64::NAN))),
        _ => {}
    }

    let lower = text.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "null" | "true" | "false" | ".inf" | "+.inf" | "-.inf" | ".nan"
    ) {
        return Err(YamlErrorKind::AmbiguousLiteral {
            literal: text.to_string(),
        });
    }

    if let Some(digits) = text.strip_prefix("0x") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(radix_number(digits, 16));
        }
    }
    if let Some(digits) = text.strip_prefix("0o") {
        if !digits.is_empty() && digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Ok(radix_number(digits, 8));
        }
    }

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(Number::Int(i)));
        }
    }
    if is_float_literal(unsigned) {
        if let Ok(f) = text.parse::<f64>() {
            return Ok(Value::Number(Number::Float(f)));
        }
    }
    Ok(Value::String(text.to_string()))
}

#[allow(clippy::cast_precision_loss)]
fn radix_number(digits: &str, radix: u32) -> Value {
    match i64::from_str_radix(digits, radix) {
        Ok(i) => Value::Number(Number::Int(i)),
        Err(_) => match u128::from_str_radix(digits, radix) {
            Ok(u) => Value::Number(Number::Float(u as f64)),
            Err(_) => Value::String(format!("0{}{digits}", if radix == 16 { 'x' } else { 'o' })),
        },
    }
}

/// `(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?` without the sign
fn is_float_literal(text: &str) -> bool {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match frac_part {
        Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => !int_part.is_empty() && digits(int_part),
    };
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(['-', '+']).unwrap_or(e);
        !e.is_empty() && digits(e)
    });
    mantissa_ok && exponent_ok
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open collections around the current token
    depth: usize,
    builder: Builder,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Open a collection at the current token
    fn enter(&mut self) -> Result<(), YamlError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let token = &self.tokens[self.pos];
            return Err(err(
                YamlErrorKind::TooDeep { limit: MAX_DEPTH },
                token.line,
                token.column,
            ));
        }
        Ok(())
    }

    fn parse_document(&mut self) -> Result<Document, YamlError> {
        let root = match self.peek().cloned() {
            None => self.builder.push(Value::Null, None, None),
            Some(first) => {
                let root = self.parse_node(None, None)?;
                self.check_dedent(first.column)?;
                if let Some(extra) = self.peek() {
                    return Err(err(
                        YamlErrorKind::TrailingContent,
                        extra.line,
                        extra.column,
                    ));
                }
                root
            }
        };
        let builder = std::mem::take(&mut self.builder);
        Ok(builder.finish(root))
    }

    /// Parse the node starting at the current token
    fn parse_node(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
    ) -> Result<NodeId, YamlError> {
        let token = self.tokens[self.pos].clone();
        match &token.kind {
            TokenKind::Dash => self.parse_sequence(parent, key, token.column),
            TokenKind::Content(text) => {
                if split_entry(text, token.line, token.column)?.is_some() {
                    self.parse_mapping(parent, key, token.column)
                } else {
                    self.pos += 1;
                    let value = scalar(text, token.line, token.column)?;
                    Ok(self.builder.push(value, parent, key))
                }
            }
        }
    }

    /// Fails when the next token is indented past a node that just ended
    fn check_dedent(&self, indent: usize) -> Result<(), YamlError> {
        match self.peek() {
            Some(next) if next.column > indent => {
                let kind = match &next.kind {
                    TokenKind::Content(text)
                        if matches!(split_entry(text, next.line, next.column), Ok(None)) =>
                    {
                        YamlErrorKind::MultiLineScalar
                    }
                    _ => YamlErrorKind::UnexpectedIndentation,
                };
                Err(err(kind, next.line, next.column))
            }
            _ => Ok(()),
        }
    }

    fn parse_sequence(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
        indent: usize,
    ) -> Result<NodeId, YamlError> {
        self.enter()?;
        let id = self.builder.push(Value::Array(Vec::new()), parent, key);
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if token.column != indent || token.kind != TokenKind::Dash {
                break;
            }
            self.pos += 1;
            let index = PathKey::Index(items.len());
            let item = match self.peek() {
                Some(next) if next.column > indent => {
                    let item = self.parse_node(Some(id), Some(index))?;
                    self.check_dedent(indent)?;
                    item
                }
                _ => self.builder.push(Value::Null, Some(id), Some(index)),
            };
            items.push(item);
        }
        self.builder.fill(id, Value::Array(items));
        self.depth -= 1;
        Ok(id)
    }

    fn parse_mapping(
        &mut self,
        parent: Option<NodeId>,
        key: Option<PathKey>,
        indent: usize,
    ) -> Result<NodeId, YamlError> {
        self.enter()?;
        let id = self.builder.push(Value::Object(Vec::new()), parent, key);
        let mut members = Vec::new();
        let mut seen = HashSet::new();

        while let Some(token) = self.peek().cloned() {
            if token.column < indent {
                break;
            }
            if token.column > indent {
                return Err(err(
                    YamlErrorKind::UnexpectedIndentation,
                    token.line,
                    token.column,
                ));
            }
            let TokenKind::Content(text) = &token.kind else {
                return Err(err(
                    YamlErrorKind::UnexpectedSequenceEntry,
                    token.line,
                    token.column,
                ));
            };
            let Some(entry) = split_entry(text, token.line, token.column)? else {
                return Err(err(YamlErrorKind::ExpectedKey, token.line, token.column));
            };
            if !seen.insert(entry.key.clone()) {
                return Err(err(
                    YamlErrorKind::DuplicateKey { key: entry.key },
                    token.line,
                    entry.key_column,
                ));
            }
            self.pos += 1;

            let member_key = Some(PathKey::Key(entry.key.clone()));
            let child = match entry.value {
                Some((value_text, value_column)) => {
                    let value = scalar(&value_text, token.line, value_column)?;
                    self.builder.push(value, Some(id), member_key)
                }
                None => match self.peek() {
                    Some(next) if next.column > indent => self.parse_node(Some(id), member_key)?,
                    Some(next) if next.column == indent && next.kind == TokenKind::Dash => {
                        self.parse_sequence(Some(id), member_key, indent)?
                    }
                    _ => self.builder.push(Value::Null, Some(id), member_key),
                },
            };
            self.check_dedent(indent)?;
            members.push((entry.key, child));
        }

        self.builder.fill(id, Value::Object(members));
        self.depth -= 1;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    fn kind_of(input: &str) -> YamlErrorKind {
        parse(input.as_bytes()).unwrap_err().kind
    }

    #[test]
    fn test_companion_file_shape() {
        let input = "\
fileFormatVersion: 2
guid: 0a1b2c3d4e5f60718293a4b5c6d7e8f9
TextureImporter:
  mipmaps:
    enabled: true
  sprites: []
  userData:
  platformSettings:
  - buildTarget: DefaultTexturePlatform
    maxTextureSize: 2048
  - buildTarget: Standalone # comment
    overridden: false
";
        let doc = parse(input.as_bytes()).unwrap();
        let root = doc.root();
        assert_eq!(root.get("fileFormatVersion").as_number().unwrap(), Number::Int(2));
        assert_eq!(
            root.get("guid").as_str().unwrap(),
            "0a1b2c3d4e5f60718293a4b5c6d7e8f9"
        );
        let importer = root.get("TextureImporter");
        assert!(importer.get("mipmaps").get("enabled").as_bool().unwrap());
        assert_eq!(importer.get("sprites").as_array().unwrap().len(), 0);
        assert!(importer.get("userData").is_null());
        let settings = importer.get("platformSettings");
        assert_eq!(
            settings.at(1).get("buildTarget").as_str().unwrap(),
            "Standalone"
        );
        assert_eq!(
            settings.at(0).get("maxTextureSize").path(),
            ".TextureImporter.platformSettings[0].maxTextureSize"
        );
    }

    #[test]
    fn test_nested_sequences() {
        let doc = parse(b"- - a\n  - b\n- c\n-\n").unwrap();
        let root = doc.root();
        assert_eq!(root.at(0).at(1).as_str().unwrap(), "b");
        assert_eq!(root.at(1).as_str().unwrap(), "c");
        assert!(root.at(2).is_null());
    }

    #[test]
    fn test_core_schema() {
        let doc = parse(
            b"a: ~\nb: NULL\nc: True\nd: 0x1F\ne: 0o17\nf: -12\ng: 1.5e3\nh: .inf\ni: -.INF\nj: .NaN\nk: 1.2.3\nl: \"null\"\nm:\n",
        )
        .unwrap();
        let r = doc.root();
        assert!(r.get("a").is_null());
        assert!(r.get("b").is_null());
        assert!(r.get("c").as_bool().unwrap());
        assert_eq!(r.get("d").as_number().unwrap(), Number::Int(31));
        assert_eq!(r.get("e").as_number().unwrap(), Number::Int(15));
        assert_eq!(r.get("f").as_number().unwrap(), Number::Int(-12));
        assert_eq!(r.get("g").as_number().unwrap(), Number::Float(1500.0));
        assert_eq!(
            r.get("h").as_number().unwrap(),
            Number::Float(f64::INFINITY)
        );
        assert_eq!(
            r.get("i").as_number().unwrap(),
            Number::Float(f64::NEG_INFINITY)
        );
        assert!(r.get("j").as_number().unwrap().as_f64().is_nan());
        assert_eq!(r.get("k").as_str().unwrap(), "1.2.3");
        assert_eq!(r.get("l").as_str().unwrap(), "null");
        assert!(r.get("m").is_null());
    }

    #[test]
    fn test_double_quoted_scalars() {
        let doc = parse(b"\"odd key\": \"a\\tb \\u00e9 # not a comment\"\n").unwrap();
        assert_eq!(
            doc.root().get("odd key").as_str().unwrap(),
            "a\tb \u{e9} # not a comment"
        );
        assert!(parse(b"a: \"x\ty\"\n").is_ok());
    }

    #[test]
    fn test_rejected_constructs() {
        assert_eq!(kind_of("a: |\n  text\n"), YamlErrorKind::BlockScalar);
        assert_eq!(kind_of("a: >-\n  text\n"), YamlErrorKind::BlockScalar);
        assert_eq!(kind_of("a: &x 1\n"), YamlErrorKind::Anchor);
        assert_eq!(kind_of("a: *x\n"), YamlErrorKind::Alias);
        assert_eq!(kind_of("a: !!str 1\n"), YamlErrorKind::Tag);
        assert_eq!(kind_of("a: 'x'\n"), YamlErrorKind::SingleQuoted);
        assert_eq!(kind_of("a: [1, 2]\n"), YamlErrorKind::FlowCollection);
        assert_eq!(kind_of("a: {b: 1}\n"), YamlErrorKind::FlowCollection);
        assert_eq!(kind_of("? a\n: b\n"), YamlErrorKind::ComplexKey);
        assert_eq!(kind_of("---\na: 1\n"), YamlErrorKind::DocumentMarker);
        assert_eq!(kind_of("a: 1\n...\n"), YamlErrorKind::DocumentMarker);
        assert_eq!(kind_of("%YAML 1.2\na: 1\n"), YamlErrorKind::Directive);
        assert_eq!(
            kind_of("a: @x\n"),
            YamlErrorKind::ReservedIndicator { indicator: '@' }
        );
        assert_eq!(kind_of("a: b: c\n"), YamlErrorKind::MappingValueNotAllowed);
        assert_eq!(kind_of("a: \"x\" y\n"), YamlErrorKind::TrailingContent);
        assert_eq!(kind_of("a: \"x\n"), YamlErrorKind::UnterminatedString);
        assert_eq!(
            kind_of("a: \"\\q\"\n"),
            YamlErrorKind::InvalidEscape {
                sequence: "\\q".into()
            }
        );
    }

    #[test]
    fn test_tabs() {
        let err = parse(b"a:\n\tb: 1\n").unwrap_err();
        assert_eq!((err.kind, err.line, err.column), (YamlErrorKind::Tab, 2, 1));
        let err = parse(b"a: x\ty\n").unwrap_err();
        assert_eq!((err.kind, err.line, err.column), (YamlErrorKind::Tab, 1, 5));
        assert!(parse(b"a: 1 # tab\tin comment\n").is_ok());
    }

    #[test]
    fn test_ambiguous_capitalization() {
        assert_eq!(
            kind_of("a: tRUE\n"),
            YamlErrorKind::AmbiguousLiteral {
                literal: "tRUE".into()
            }
        );
        assert_eq!(
            kind_of("- NuLL\n"),
            YamlErrorKind::AmbiguousLiteral {
                literal: "NuLL".into()
            }
        );
    }

    #[test]
    fn test_structure_errors_are_located() {
        let err = parse(b"a: 1\nb: 2\na: 3\n").unwrap_err();
        assert_eq!(err.kind, YamlErrorKind::DuplicateKey { key: "a".into() });
        assert_eq!((err.line, err.column), (3, 1));

        let err = parse(b"a: one\n  two\n").unwrap_err();
        assert_eq!(err.kind, YamlErrorKind::MultiLineScalar);
        assert_eq!((err.line, err.column), (2, 3));

        assert_eq!(kind_of("a: 1\n  b: 2\n"), YamlErrorKind::UnexpectedIndentation);
        assert_eq!(kind_of("a: 1\n- b\n"), YamlErrorKind::UnexpectedSequenceEntry);
        assert_eq!(kind_of("a: 1\nplain\n"), YamlErrorKind::ExpectedKey);
        assert_eq!(kind_of("  a: 1\nb: 2\n"), YamlErrorKind::TrailingContent);
    }

    #[test]
    fn test_sequence_at_parent_indent() {
        let doc = parse(b"deps:\n- a\n- b\nnext: 1\n").unwrap();
        assert_eq!(doc.root().get("deps").as_array().unwrap().len(), 2);
        assert_eq!(doc.root().get("next").as_number().unwrap(), Number::Int(1));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse(b"a: 1\nb: x\xffy\n").unwrap_err();
        assert_eq!(
            (err.kind, err.line, err.column),
            (YamlErrorKind::InvalidUtf8, 2, 5)
        );
        let doc = parse_with(b"b: x\xffy\n", YamlOptions::legacy()).unwrap();
        assert_eq!(doc.root().get("b").as_str().unwrap(), "x\u{FFFD}y");
    }

    #[test]
    fn test_empty_and_scalar_documents() {
        assert_eq!(parse(b"").unwrap().root().kind(), NodeKind::Null);
        assert_eq!(parse(b"# only a comment\n").unwrap().root().kind(), NodeKind::Null);
        assert_eq!(parse(b"hello\n").unwrap().root().as_str().unwrap(), "hello");
        assert_eq!(kind_of("hello\nworld\n"), YamlErrorKind::TrailingContent);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "- ".repeat(MAX_DEPTH + 1) + "x\n";
        let error = parse(deep.as_bytes()).unwrap_err();
        assert_eq!(error.kind, YamlErrorKind::TooDeep { limit: MAX_DEPTH });
        assert_eq!((error.line, error.column), (1, 2 * MAX_DEPTH + 1));

        let ok = "- ".repeat(MAX_DEPTH) + "x\n";
        let doc = parse(ok.as_bytes()).unwrap();
        let mut node = doc.root();
        for _ in 0..MAX_DEPTH {
            node = node.at(0);
        }
        assert_eq!(node.as_str().unwrap(), "x");

        let huge = "- ".repeat(200_000) + "x\n";
        assert_eq!(kind_of(&huge), YamlErrorKind::TooDeep { limit: MAX_DEPTH });
    }

    #[test]
    fn test_nested_mappings_count_toward_the_limit() {
        let mut deep = String::new();
        for level in 0..=MAX_DEPTH {
            deep.push_str(&" ".repeat(level));
            deep.push_str("k:\n");
        }
        deep.push_str(&" ".repeat(MAX_DEPTH + 1));
        deep.push_str("k: v\n");
        assert_eq!(kind_of(&deep), YamlErrorKind::TooDeep { limit: MAX_DEPTH });
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = parse(b"a: 1\r\nb:\r\n  - x\r\n").unwrap();
        assert_eq!(doc.root().get("b").at(0).as_str().unwrap(), "x");
    }
}
