//! Finalized batches
//!
//! A batch is the unit that crosses the host boundary: the interned keys, the
//! node arena, the frozen child storage compound nodes point into, and one
//! root index per document. All documents of a batch share the same arena and
//! key table.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result, codec,
    assembly::frozen::resolve_span,
    node::{ElementSpan, Field, FieldSpan, FrozenSpan, Idx, KeyId, Node},
};

/// Owned batch with no ties to the builder that produced it
///
/// Serde support is meant for moving a batch between processes. JSON has no
/// NaN or infinity, so a batch holding a non-finite float serializes the
/// value as `null` and the result does not deserialize. Such a batch also
/// never compares equal, not even to itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Batch {
    strings: Vec<Box<str>>,
    arena: Vec<Node>,
    fields: Vec<Field>,
    elements: Vec<Idx>,
    roots: Vec<Idx>,
}

impl Batch {
    /// Assemble a batch from raw parts, e.g. ones received from a guest.
    ///
    /// Nothing is checked here; call [`validate`](Self::validate) before
    /// decoding untrusted parts.
    pub fn from_parts(
        strings: Vec<Box<str>>,
        arena: Vec<Node>,
        fields: Vec<Field>,
        elements: Vec<Idx>,
        roots: Vec<Idx>,
    ) -> Self {
        Self {
            strings,
            arena,
            fields,
            elements,
            roots,
        }
    }

    /// Borrow as a [`BatchView`]
    pub fn view(&self) -> BatchView<'_> {
        BatchView::new(
            &self.strings,
            &self.arena,
            &self.fields,
            &self.elements,
            &self.roots,
        )
    }

    /// Interned keys in id order
    pub fn strings(&self) -> &[Box<str>] {
        &self.strings
    }

    /// Nodes in append order
    pub fn arena(&self) -> &[Node] {
        &self.arena
    }

    /// Root index of each document
    pub fn roots(&self) -> &[Idx] {
        &self.roots
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the batch holds no documents
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// See [`BatchView::validate`]
    pub fn validate(&self) -> Result<()> {
        self.view().validate()
    }

    /// Render as newline-delimited JSON
    pub fn to_ndjson(&self) -> String {
        codec::to_ndjson_string(&self.view())
    }
}

/// Batch borrowing a builder's buffers, valid only while the borrow lasts
#[derive(Debug, Clone, Copy)]
pub struct BatchView<'a> {
    strings: &'a [Box<str>],
    arena: &'a [Node],
    fields: &'a [Field],
    elements: &'a [Idx],
    roots: &'a [Idx],
}

impl<'a> BatchView<'a> {
    pub(crate) fn new(
        strings: &'a [Box<str>],
        arena: &'a [Node],
        fields: &'a [Field],
        elements: &'a [Idx],
        roots: &'a [Idx],
    ) -> Self {
        Self {
            strings,
            arena,
            fields,
            elements,
            roots,
        }
    }

    /// Deep copy into an owned [`Batch`]
    pub fn to_batch(&self) -> Batch {
        Batch {
            strings: self.strings.to_vec(),
            arena: self.arena.to_vec(),
            fields: self.fields.to_vec(),
            elements: self.elements.to_vec(),
            roots: self.roots.to_vec(),
        }
    }

    /// Interned keys in id order
    pub fn strings(&self) -> &'a [Box<str>] {
        self.strings
    }

    /// Nodes in append order
    pub fn arena(&self) -> &'a [Node] {
        self.arena
    }

    /// Frozen object fields
    pub fn fields(&self) -> &'a [Field] {
        self.fields
    }

    /// Frozen array elements
    pub fn elements(&self) -> &'a [Idx] {
        self.elements
    }

    /// Root index of each document
    pub fn roots(&self) -> &'a [Idx] {
        self.roots
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the batch holds no documents
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Node at `idx`, if it exists
    pub fn get(&self, idx: Idx) -> Option<&'a Node> {
        self.arena.get(idx.index())
    }

    /// Node at `idx`.
    ///
    /// Panics on an index outside the arena: such an index cannot come from
    /// a well-formed batch.
    pub fn node(&self, idx: Idx) -> &'a Node {
        match self.arena.get(idx.index()) {
            Some(node) => node,
            None => panic!(
                "batch index {idx} out of bounds for arena of length {}",
                self.arena.len()
            ),
        }
    }

    /// Fields covered by an object span
    pub fn object_fields(&self, span: FieldSpan) -> &'a [Field] {
        resolve_span(self.fields, span)
    }

    /// Elements covered by an array span
    pub fn array_elements(&self, span: ElementSpan) -> &'a [Idx] {
        resolve_span(self.elements, span)
    }

    /// Key text for `id`; panics if the batch has no such key
    pub fn key(&self, id: KeyId) -> &'a str {
        match self.strings.get(id.index()) {
            Some(key) => key,
            None => panic!(
                "key id {} out of bounds for {} interned strings",
                id.get(),
                self.strings.len()
            ),
        }
    }

    /// Value of the first field named `key` in the object at `object`
    pub fn lookup(&self, object: Idx, key: &str) -> Option<Idx> {
        let span = self.node(object).as_object()?;
        self.object_fields(span)
            .iter()
            .find(|field| self.key(field.key) == key)
            .map(|field| field.value)
    }

    /// Check that every reference in the batch resolves.
    ///
    /// Roots must lie inside the arena; spans must lie inside the frozen
    /// buffers; children must precede their parent; keys must be interned.
    pub fn validate(&self) -> Result<()> {
        for (i, root) in self.roots.iter().enumerate() {
            if root.index() >= self.arena.len() {
                return Err(Error::invalid_batch(format!(
                    "root {i} points at {root}, arena has {} nodes",
                    self.arena.len()
                )));
            }
        }

        for (pos, node) in self.arena.iter().enumerate() {
            match node {
                Node::Array(span) => {
                    let elements = checked_span(self.elements, *span, pos)?;
                    for child in elements {
                        check_precedes(*child, pos)?;
                    }
                }
                Node::Object(span) => {
                    let fields = checked_span(self.fields, *span, pos)?;
                    for field in fields {
                        if field.key.index() >= self.strings.len() {
                            return Err(Error::invalid_batch(format!(
                                "object #{pos} uses key id {}, only {} strings interned",
                                field.key.get(),
                                self.strings.len()
                            )));
                        }
                        check_precedes(field.value, pos)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn checked_span<'a, T>(items: &'a [T], span: FrozenSpan<T>, pos: usize) -> Result<&'a [T]> {
    let start = span.start() as usize;
    usize::try_from(span.end())
        .ok()
        .and_then(|end| items.get(start..end))
        .ok_or_else(|| {
            Error::invalid_batch(format!(
                "node #{pos} span {span:?} exceeds frozen storage of length {}",
                items.len()
            ))
        })
}

fn check_precedes(child: Idx, parent: usize) -> Result<()> {
    if child.index() >= parent {
        return Err(Error::invalid_batch(format!(
            "node #{parent} refers to {child}, which does not precede it"
        )));
    }
    Ok(())
}
