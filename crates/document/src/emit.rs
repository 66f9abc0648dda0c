//! Compact JSON serialization of document trees

use crate::tree::{Node, Number, Value};
use std::fmt::Write as _;

pub(crate) fn write_node(out: &mut String, node: &Node<'_>) {
    match node.raw() {
        None | Some(Value::Null) => out.push_str("null"),
        Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
        Some(Value::Number(n)) => write_number(out, *n),
        Some(Value::String(s)) => write_string(out, s),
        Some(Value::Array(items)) => {
            out.push('[');
            for (i, id) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_node(out, &node.child(*id));
            }
            out.push(']');
        }
        Some(Value::Object(members)) => {
            out.push('{');
            for (i, (key, id)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_node(out, &node.child(*id));
            }
            out.push('}');
        }
    }
}

// Non-finite floats have no JSON spelling and are written as null.
fn write_number(out: &mut String, n: Number) {
    match n {
        Number::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Number::Float(f) if f.is_finite() => {
            // Debug formatting always keeps a fraction or exponent, so the
            // value re-parses as a float rather than an integer.
            let _ = write!(out, "{f:?}");
        }
        Number::Float(_) => out.push_str("null"),
    }
}

pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
