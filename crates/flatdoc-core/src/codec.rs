//! Canonical batch decode
//!
//! Renders each root of a batch as one JSON document followed by `\n`. The
//! token-level output is produced by serde_json's [`Formatter`], so a batch
//! built from a value decodes to the same bytes `serde_json::to_string` would
//! produce for that value. Byte blobs render as base64 strings.
//!
//! Decoding assumes a well-formed batch and panics on dangling indices; run
//! [`BatchView::validate`] first on batches from untrusted sources.

use std::io::{self, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{
    Map, Number, Value,
    ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter},
};

use crate::{
    batch::BatchView,
    node::{Field, Idx, Node},
};

/// Write every document of `view` as compact NDJSON
pub fn write_ndjson<W: Write>(view: &BatchView<'_>, writer: &mut W) -> io::Result<()> {
    write_with(view, writer, CompactFormatter)
}

/// Write every document of `view` pretty-printed, each followed by `\n`
pub fn write_ndjson_pretty<W: Write>(view: &BatchView<'_>, writer: &mut W) -> io::Result<()> {
    write_with(view, writer, PrettyFormatter::new())
}

/// Render `view` as compact NDJSON bytes
pub fn to_ndjson_vec(view: &BatchView<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(view.arena().len() * 8);
    append_ndjson(view, &mut out);
    out
}

/// Append compact NDJSON for `view` to `out`
pub fn append_ndjson(view: &BatchView<'_>, out: &mut Vec<u8>) {
    // Writing into a Vec cannot fail.
    if let Err(err) = write_ndjson(view, out) {
        unreachable!("in-memory write failed: {err}");
    }
}

/// Render `view` as a compact NDJSON string
pub fn to_ndjson_string(view: &BatchView<'_>) -> String {
    into_utf8(to_ndjson_vec(view))
}

/// Render a single node and its descendants without a trailing newline
pub fn node_to_string(view: &BatchView<'_>, idx: Idx) -> String {
    let mut out = Vec::new();
    let mut formatter = CompactFormatter;
    if let Err(err) = write_node(view, idx, &mut out, &mut formatter) {
        unreachable!("in-memory write failed: {err}");
    }
    into_utf8(out)
}

fn into_utf8(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        // Every fragment written is either ASCII or copied from a `str`.
        Err(err) => unreachable!("NDJSON output is not UTF-8: {err}"),
    }
}

fn write_with<W: Write, F: Formatter>(
    view: &BatchView<'_>,
    writer: &mut W,
    mut formatter: F,
) -> io::Result<()> {
    for &root in view.roots() {
        write_node(view, root, writer, &mut formatter)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Open compound node and the position of its next child
enum Cursor<'a> {
    Array { elements: &'a [Idx], next: usize },
    Object { fields: &'a [Field], next: usize },
}

/// Write the tree under `root` depth-first with an explicit stack, so depth
/// is bounded by memory only.
fn write_node<'a, W: Write, F: Formatter>(
    view: &BatchView<'a>,
    root: Idx,
    w: &mut W,
    f: &mut F,
) -> io::Result<()> {
    let mut stack: Vec<Cursor<'a>> = Vec::new();
    let mut pending = Some(root);

    loop {
        if let Some(idx) = pending.take() {
            match view.node(idx) {
                Node::Array(span) => {
                    f.begin_array(w)?;
                    stack.push(Cursor::Array {
                        elements: view.array_elements(*span),
                        next: 0,
                    });
                }
                Node::Object(span) => {
                    f.begin_object(w)?;
                    stack.push(Cursor::Object {
                        fields: view.object_fields(*span),
                        next: 0,
                    });
                }
                scalar => write_scalar(w, f, scalar)?,
            }
        }

        let Some(top) = stack.last_mut() else {
            return Ok(());
        };
        match top {
            Cursor::Array { elements, next } => {
                if *next > 0 {
                    f.end_array_value(w)?;
                }
                match elements.get(*next) {
                    Some(&child) => {
                        f.begin_array_value(w, *next == 0)?;
                        *next += 1;
                        pending = Some(child);
                    }
                    None => {
                        f.end_array(w)?;
                        stack.pop();
                    }
                }
            }
            Cursor::Object { fields, next } => {
                if *next > 0 {
                    f.end_object_value(w)?;
                }
                match fields.get(*next) {
                    Some(field) => {
                        f.begin_object_key(w, *next == 0)?;
                        write_str(w, f, view.key(field.key))?;
                        f.end_object_key(w)?;
                        f.begin_object_value(w)?;
                        *next += 1;
                        pending = Some(field.value);
                    }
                    None => {
                        f.end_object(w)?;
                        stack.pop();
                    }
                }
            }
        }
    }
}

fn write_scalar<W: Write, F: Formatter>(w: &mut W, f: &mut F, node: &Node) -> io::Result<()> {
    match node {
        Node::Null => f.write_null(w),
        Node::Boolean(v) => f.write_bool(w, *v),
        Node::Integer(v) => f.write_i64(w, *v),
        Node::Float(v) if v.is_finite() => f.write_f64(w, *v),
        Node::Float(_) => f.write_null(w),
        Node::String(s) => write_str(w, f, s),
        Node::Bytes(b) => {
            f.begin_string(w)?;
            f.write_string_fragment(w, &STANDARD.encode(b))?;
            f.end_string(w)
        }
        Node::Array(_) | Node::Object(_) => unreachable!("compound node passed as scalar"),
    }
}

/// Quote `s`, escaping `"`, `\` and every byte below 0x20.
fn write_str<W: Write, F: Formatter>(w: &mut W, f: &mut F, s: &str) -> io::Result<()> {
    f.begin_string(w)?;
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape = match byte {
            b'"' => CharEscape::Quote,
            b'\\' => CharEscape::ReverseSolidus,
            b'\n' => CharEscape::LineFeed,
            b'\r' => CharEscape::CarriageReturn,
            b'\t' => CharEscape::Tab,
            0x08 => CharEscape::Backspace,
            0x0C => CharEscape::FormFeed,
            0x00..=0x1F => CharEscape::AsciiControl(byte),
            _ => continue,
        };
        if start < i {
            f.write_string_fragment(w, &s[start..i])?;
        }
        f.write_char_escape(w, escape)?;
        start = i + 1;
    }
    if start < bytes.len() {
        f.write_string_fragment(w, &s[start..])?;
    }
    f.end_string(w)
}

/// Partially converted compound node
enum Partial<'a> {
    Array {
        elements: &'a [Idx],
        out: Vec<Value>,
    },
    Object {
        fields: &'a [Field],
        next: usize,
        out: Map<String, Value>,
    },
}

impl<'a> Partial<'a> {
    fn next_child(&self) -> Option<Idx> {
        match self {
            Partial::Array { elements, out } => elements.get(out.len()).copied(),
            Partial::Object { fields, next, .. } => fields.get(*next).map(|field| field.value),
        }
    }

    fn accept(&mut self, view: &BatchView<'a>, value: Value) {
        match self {
            Partial::Array { out, .. } => out.push(value),
            Partial::Object { fields, next, out } => {
                if let Some(field) = fields.get(*next) {
                    out.insert(view.key(field.key).to_owned(), value);
                }
                *next += 1;
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Partial::Array { out, .. } => Value::Array(out),
            Partial::Object { out, .. } => Value::Object(out),
        }
    }
}

/// Convert the node at `idx` into a [`serde_json::Value`].
///
/// Fields keep insertion order. Non-finite floats become `Null` and byte
/// blobs become base64 strings, matching the text rendering. A `Map` holds
/// each key once, so a repeated key keeps its first position and its last
/// value.
pub fn to_json_value(view: &BatchView<'_>, idx: Idx) -> Value {
    let mut stack: Vec<Partial<'_>> = Vec::new();
    let mut done = open_value(view, idx, &mut stack);

    loop {
        if let Some(value) = done.take() {
            match stack.last_mut() {
                Some(parent) => parent.accept(view, value),
                None => return value,
            }
        }
        done = match stack.last().and_then(Partial::next_child) {
            Some(child) => open_value(view, child, &mut stack),
            None => stack.pop().map(Partial::finish),
        };
    }
}

/// Scalars convert immediately; compounds are pushed as [`Partial`]s.
fn open_value<'a>(view: &BatchView<'a>, idx: Idx, stack: &mut Vec<Partial<'a>>) -> Option<Value> {
    let value = match view.node(idx) {
        Node::Null => Value::Null,
        Node::Boolean(v) => Value::Bool(*v),
        Node::Integer(v) => Value::Number((*v).into()),
        Node::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        Node::String(s) => Value::String(s.clone()),
        Node::Bytes(b) => Value::String(STANDARD.encode(b)),
        Node::Array(span) => {
            let elements = view.array_elements(*span);
            stack.push(Partial::Array {
                elements,
                out: Vec::with_capacity(elements.len()),
            });
            return None;
        }
        Node::Object(span) => {
            let fields = view.object_fields(*span);
            stack.push(Partial::Object {
                fields,
                next: 0,
                out: Map::with_capacity(fields.len()),
            });
            return None;
        }
    };
    Some(value)
}
