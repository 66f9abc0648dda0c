//! Arena-backed document tree
//!
//! Every node records the parent it hangs off and the key or index that
//! reached it, so a jq-style location can be rebuilt for any node without
//! threading paths through the code that walks the tree. Nodes are addressed
//! by index into the owning [`Document`]; a document is immutable once built.

use pkgcheck_errors::DocumentError;
use std::fmt;

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Step from a parent node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Key(String),
    Index(usize),
}

/// Numeric payload of a number node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i),
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// Kind of a node as seen by casts and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    /// Sentinel for a member or element that does not exist
    Absent,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Absent => "absent",
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<NodeId>),
    Object(Vec<(String, NodeId)>),
}

impl Value {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Null => NodeKind::Null,
            Self::Bool(_) => NodeKind::Bool,
            Self::Number(_) => NodeKind::Number,
            Self::String(_) => NodeKind::String,
            Self::Array(_) => NodeKind::Array,
            Self::Object(_) => NodeKind::Object,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    parent: Option<NodeId>,
    key: Option<PathKey>,
}

/// A parsed JSON or YAML document
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Document {
    /// The top-level node
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        Node {
            doc: self,
            at: At::Present(self.root),
        }
    }

    /// Number of nodes in the document
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Serialize to compact JSON text
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.root().to_json_string()
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }
}

/// Incremental construction of a [`Document`].
///
/// Containers are allocated before their children so the children can point
/// back at them; the container's member list is filled in once all children
/// exist.
#[derive(Debug, Default)]
pub(crate) struct Builder {
    slots: Vec<Slot>,
}

impl Builder {
    pub(crate) fn push(
        &mut self,
        value: Value,
        parent: Option<NodeId>,
        key: Option<PathKey>,
    ) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot { value, parent, key });
        id
    }

    pub(crate) fn fill(&mut self, id: NodeId, value: Value) {
        self.slots[id.0].value = value;
    }

    pub(crate) fn finish(self, root: NodeId) -> Document {
        Document {
            slots: self.slots,
            root,
        }
    }
}

#[derive(Debug, Clone)]
enum At {
    Present(NodeId),
    Absent { path: String },
}

/// Borrowed view of one node (or of a missing member)
#[derive(Debug, Clone)]
pub struct Node<'a> {
    doc: &'a Document,
    at: At,
}

impl<'a> Node<'a> {
    fn present(doc: &'a Document, id: NodeId) -> Self {
        Self {
            doc,
            at: At::Present(id),
        }
    }

    fn absent(doc: &'a Document, path: String) -> Self {
        Self {
            doc,
            at: At::Absent { path },
        }
    }

    fn value(&self) -> Option<&'a Value> {
        match &self.at {
            At::Present(id) => Some(&self.doc.slot(*id).value),
            At::Absent { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.value().map_or(NodeKind::Absent, Value::kind)
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self.at, At::Absent { .. })
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind() == NodeKind::Null
    }

    /// Key or index that reached this node from its parent
    #[must_use]
    pub fn key(&self) -> Option<&'a PathKey> {
        match &self.at {
            At::Present(id) => self.doc.slot(*id).key.as_ref(),
            At::Absent { .. } => None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node<'a>> {
        match &self.at {
            At::Present(id) => self
                .doc
                .slot(*id)
                .parent
                .map(|p| Node::present(self.doc, p)),
            At::Absent { .. } => None,
        }
    }

    /// jq-style location of this node, e.g. `.dependencies."com.example"[2]`
    #[must_use]
    pub fn path(&self) -> String {
        match &self.at {
            At::Absent { path } => path.clone(),
            At::Present(id) => {
                let mut keys = Vec::new();
                let mut cursor = Some(*id);
                while let Some(current) = cursor {
                    let slot = self.doc.slot(current);
                    if let Some(key) = &slot.key {
                        keys.push(key.clone());
                    }
                    cursor = slot.parent;
                }
                keys.reverse();
                format_path(&keys)
            }
        }
    }

    /// Member lookup; absent when missing or when this node is not an object
    #[must_use]
    pub fn get(&self, key: &str) -> Node<'a> {
        if let Some(Value::Object(members)) = self.value() {
            if let Some((_, id)) = members.iter().find(|(k, _)| k == key) {
                return Node::present(self.doc, *id);
            }
        }
        Node::absent(self.doc, append_path(&self.path(), &PathKey::Key(key.to_string())))
    }

    /// Element lookup; absent when out of range or when this node is not an array
    #[must_use]
    pub fn at(&self, index: usize) -> Node<'a> {
        if let Some(Value::Array(items)) = self.value() {
            if let Some(id) = items.get(index) {
                return Node::present(self.doc, *id);
            }
        }
        Node::absent(self.doc, append_path(&self.path(), &PathKey::Index(index)))
    }

    fn mismatch(&self, expected: NodeKind) -> DocumentError {
        DocumentError::type_mismatch(self.path(), expected, self.kind())
    }

    /// # Errors
    /// Returns `TypeMismatch` when the node is not a boolean.
    pub fn as_bool(&self) -> Result<bool, DocumentError> {
        match self.value() {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(self.mismatch(NodeKind::Bool)),
        }
    }

    /// # Errors
    /// Returns `TypeMismatch` when the node is not a string.
    pub fn as_str(&self) -> Result<&'a str, DocumentError> {
        match self.value() {
            Some(Value::String(s)) => Ok(s.as_str()),
            _ => Err(self.mismatch(NodeKind::String)),
        }
    }

    /// # Errors
    /// Returns `TypeMismatch` when the node is not a number.
    pub fn as_number(&self) -> Result<Number, DocumentError> {
        match self.value() {
            Some(Value::Number(n)) => Ok(*n),
            _ => Err(self.mismatch(NodeKind::Number)),
        }
    }

    /// # Errors
    /// Returns `TypeMismatch` when the node is not an array.
    pub fn as_array(&self) -> Result<Vec<Node<'a>>, DocumentError> {
        match self.value() {
            Some(Value::Array(items)) => Ok(items
                .iter()
                .map(|id| Node::present(self.doc, *id))
                .collect()),
            _ => Err(self.mismatch(NodeKind::Array)),
        }
    }

    /// Members in document order
    ///
    /// # Errors
    /// Returns `TypeMismatch` when the node is not an object.
    pub fn as_object(&self) -> Result<Vec<(&'a str, Node<'a>)>, DocumentError> {
        match self.value() {
            Some(Value::Object(members)) => Ok(members
                .iter()
                .map(|(k, id)| (k.as_str(), Node::present(self.doc, *id)))
                .collect()),
            _ => Err(self.mismatch(NodeKind::Object)),
        }
    }

    /// Optional string member: `Ok(None)` when absent, error on any other kind
    ///
    /// # Errors
    /// Returns `TypeMismatch` when the member exists but is not a string.
    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, DocumentError> {
        let member = self.get(key);
        if member.is_absent() {
            Ok(None)
        } else {
            member.as_str().map(Some)
        }
    }

    /// Structural equality: same kinds and values, members in the same order
    #[must_use]
    pub fn same_value(&self, other: &Node<'_>) -> bool {
        match (self.value(), other.value()) {
            (None, None) | (Some(Value::Null), Some(Value::Null)) => true,
            (Some(Value::Bool(a)), Some(Value::Bool(b))) => a == b,
            (Some(Value::Number(a)), Some(Value::Number(b))) => a == b,
            (Some(Value::String(a)), Some(Value::String(b))) => a == b,
            (Some(Value::Array(_)), Some(Value::Array(_))) => {
                match (self.as_array(), other.as_array()) {
                    (Ok(a), Ok(b)) => {
                        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.same_value(y))
                    }
                    _ => false,
                }
            }
            (Some(Value::Object(_)), Some(Value::Object(_))) => {
                match (self.as_object(), other.as_object()) {
                    (Ok(a), Ok(b)) => {
                        a.len() == b.len()
                            && a
                                .iter()
                                .zip(&b)
                                .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Serialize this subtree to compact JSON text
    #[must_use]
    pub fn to_json_string(&self) -> String {
        let mut out = String::new();
        crate::emit::write_node(&mut out, self);
        out
    }

    pub(crate) fn raw(&self) -> Option<&'a Value> {
        self.value()
    }

    pub(crate) fn child(&self, id: NodeId) -> Node<'a> {
        Node::present(self.doc, id)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn push_key(out: &mut String, key: &PathKey) {
    match key {
        PathKey::Index(i) => {
            out.push('[');
            out.push_str(&i.to_string());
            out.push(']');
        }
        PathKey::Key(k) if is_identifier(k) => {
            out.push('.');
            out.push_str(k);
        }
        PathKey::Key(k) => {
            out.push('.');
            crate::emit::write_string(out, k);
        }
    }
}

/// Render a key sequence as a jq-style path; the empty sequence is `.`
#[must_use]
pub fn format_path(keys: &[PathKey]) -> String {
    if keys.is_empty() {
        return ".".to_string();
    }
    let mut out = String::new();
    for key in keys {
        push_key(&mut out, key);
    }
    out
}

fn append_path(base: &str, key: &PathKey) -> String {
    let mut out = if base == "." {
        String::new()
    } else {
        base.to_string()
    };
    push_key(&mut out, key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json;

    #[test]
    fn test_paths_quote_non_identifier_keys() {
        let doc = json::parse(br#"{"a":{"b":[1,2,{"c d":true}]}}"#).unwrap();
        let node = doc.root().get("a").get("b").at(2).get("c d");
        assert_eq!(node.path(), r#".a.b[2]."c d""#);
        assert!(node.as_bool().unwrap());
    }

    #[test]
    fn test_root_path_is_dot() {
        let doc = json::parse(b"[]").unwrap();
        assert_eq!(doc.root().path(), ".");
        assert_eq!(doc.root().at(0).path(), "[0]");
    }

    #[test]
    fn test_absent_members_compose() {
        let doc = json::parse(br#"{"a":1}"#).unwrap();
        let missing = doc.root().get("x").get("y").at(3);
        assert!(missing.is_absent());
        assert_eq!(missing.kind(), NodeKind::Absent);
        assert_eq!(missing.path(), ".x.y[3]");
    }

    #[test]
    fn test_type_mismatch_names_kinds_and_path() {
        let doc = json::parse(br#"{"version":1}"#).unwrap();
        let err = doc.root().get("version").as_str().unwrap_err();
        assert_eq!(
            err,
            DocumentError::TypeMismatch {
                path: ".version".into(),
                expected: "string".into(),
                actual: "number".into(),
            }
        );
        let err = doc.root().get("name").as_str().unwrap_err();
        assert_eq!(err.to_string(), ".name: expected string, found absent");
    }

    #[test]
    fn test_parent_and_key_backlinks() {
        let doc = json::parse(br#"{"deps":{"x":"1.0.0"}}"#).unwrap();
        let node = doc.root().get("deps").get("x");
        assert_eq!(node.key(), Some(&PathKey::Key("x".into())));
        let parent = node.parent().unwrap();
        assert_eq!(parent.path(), ".deps");
        assert!(parent.parent().unwrap().parent().is_none());
    }

    #[test]
    fn test_opt_str() {
        let doc = json::parse(br#"{"a":"x","b":2}"#).unwrap();
        assert_eq!(doc.root().opt_str("a").unwrap(), Some("x"));
        assert_eq!(doc.root().opt_str("z").unwrap(), None);
        assert!(doc.root().opt_str("b").is_err());
    }
}
