use std::fmt::Write as _;

use dd_core::{FieldKey, HASH_SENTINEL, Node};

const INDENT: &str = "  ";

/// Render a Structural Tree as editable text.
///
/// Pure and deterministic: identical trees render to identical text.
/// Every scalar renders to a token whose original type tag is recoverable
/// from the token alone — floats always carry a `.` or an exponent,
/// strings are always quoted, hash references carry the `###` sentinel.
pub fn render(tree: &Node) -> String {
    let mut out = String::new();
    render_value(tree, 0, &mut out);
    out.push('\n');
    out
}

fn render_value(node: &Node, depth: usize, out: &mut String) {
    match node {
        Node::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Node::Float(v) => out.push_str(&float_token(*v)),
        Node::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Node::String(s) => render_string(s, out),
        Node::HashRef(hash) => {
            let _ = write!(out, "{HASH_SENTINEL}{hash}");
        }
        Node::Object(fields) => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (index, (key, value)) in fields.iter().enumerate() {
                indent(depth + 1, out);
                render_key(key, out);
                out.push_str(": ");
                render_value(value, depth + 1, out);
                if index + 1 < fields.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            indent(depth, out);
            out.push('}');
        }
        Node::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (index, item) in items.iter().enumerate() {
                indent(depth + 1, out);
                render_value(item, depth + 1, out);
                if index + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            indent(depth, out);
            out.push(']');
        }
    }
}

fn render_key(key: &FieldKey, out: &mut String) {
    match key {
        FieldKey::Name(name) => render_string(name, out),
        FieldKey::Unresolved(hash) => {
            let _ = write!(out, "{HASH_SENTINEL}{hash}");
        }
    }
}

fn render_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Format a float so the token re-parses to the same `f32` bits and is
/// never mistakable for an integer literal.
fn float_token(v: f32) -> String {
    if v.is_nan() {
        // Any NaN bit pattern is valid container data; non-canonical
        // payloads carry their bits so re-encoding preserves them.
        let bits = v.to_bits();
        return if bits == f32::NAN.to_bits() {
            "nan".to_string()
        } else {
            format!("nan#0x{bits:08x}")
        };
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    // Shortest round-tripping form; guarantee a '.' when it comes out
    // looking like a plain integer (Debug already emits one for f32,
    // exponent forms excepted).
    let text = format!("{v:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
