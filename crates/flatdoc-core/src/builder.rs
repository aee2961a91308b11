//! Arena builder: the construction API
//!
//! A builder owns the arena, both scratch buffers and both frozen buffers of
//! one build cycle. Scalars are pushed straight into the arena; objects and
//! arrays are staged in scratch between `*_start` and `*_end` and frozen when
//! they close. Every append returns the [`Idx`] of the node it created.
//!
//! String and byte values are always copied into the arena at append time,
//! so callers may reuse their buffers immediately.

use smallvec::SmallVec;

use crate::{
    assembly::{Frozen, Scratch},
    batch::{Batch, BatchView},
    config::BuilderConfig,
    node::{Field, Idx, KeyId, Node},
    strings::StringTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object,
    Array,
}

/// Builds flat documents into a reusable arena
#[derive(Debug, Clone)]
pub struct ArenaBuilder {
    arena: Vec<Node>,
    fields: Scratch<Field>,
    elements: Scratch<Idx>,
    frozen_fields: Frozen<Field>,
    frozen_elements: Frozen<Idx>,
    scopes: SmallVec<[Scope; 16]>,
    strings: Option<StringTable>,
}

impl ArenaBuilder {
    /// Create a builder with default capacities and no string table
    pub fn new() -> Self {
        Self::with_config(&BuilderConfig::default())
    }

    /// Create a builder with the given capacities and no string table
    pub fn with_config(config: &BuilderConfig) -> Self {
        Self {
            arena: Vec::with_capacity(config.arena_capacity),
            fields: Scratch::with_capacity(config.field_capacity, config.stack_capacity),
            elements: Scratch::with_capacity(config.element_capacity, config.stack_capacity),
            frozen_fields: Frozen::with_capacity(config.frozen_field_capacity),
            frozen_elements: Frozen::with_capacity(config.frozen_element_capacity),
            scopes: SmallVec::new(),
            strings: None,
        }
    }

    /// Attach `table` and return the builder
    pub fn with_string_table(mut self, table: StringTable) -> Self {
        self.strings = Some(table);
        self
    }

    /// Attach `table`, returning the previously attached one
    pub fn use_string_table(&mut self, table: StringTable) -> Option<StringTable> {
        self.strings.replace(table)
    }

    /// Detach the string table
    pub fn take_string_table(&mut self) -> Option<StringTable> {
        self.strings.take()
    }

    /// Attached string table, if any
    pub fn string_table(&self) -> Option<&StringTable> {
        self.strings.as_ref()
    }

    /// Attached string table, mutably
    pub fn string_table_mut(&mut self) -> Option<&mut StringTable> {
        self.strings.as_mut()
    }

    /// Truncate arena, scratch and frozen buffers, keeping capacity.
    ///
    /// The attached string table is left alone; see
    /// [`reset_all`](Self::reset_all).
    pub fn reset(&mut self) {
        self.arena.clear();
        self.fields.clear();
        self.elements.clear();
        self.frozen_fields.clear();
        self.frozen_elements.clear();
        self.scopes.clear();
    }

    /// [`reset`](Self::reset) plus a reset of the attached string table
    pub fn reset_all(&mut self) {
        self.reset();
        if let Some(table) = self.strings.as_mut() {
            table.reset();
        }
    }

    fn push(&mut self, node: Node) -> Idx {
        let idx = match u32::try_from(self.arena.len()) {
            Ok(raw) => Idx::new(raw),
            Err(_) => panic!("ArenaBuilder: arena exceeds u32 addressing"),
        };
        self.arena.push(node);
        idx
    }

    // -------------------- Scalars --------------------

    /// Append a null node
    pub fn append_null(&mut self) -> Idx {
        self.push(Node::Null)
    }

    /// Append a boolean node
    pub fn append_bool(&mut self, v: bool) -> Idx {
        self.push(Node::Boolean(v))
    }

    /// Append an integer node
    pub fn append_int(&mut self, v: i64) -> Idx {
        self.push(Node::Integer(v))
    }

    /// Append a float node
    pub fn append_float(&mut self, v: f64) -> Idx {
        self.push(Node::Float(v))
    }

    /// Append a float node for an `f32`.
    ///
    /// The value is widened through its shortest decimal form, so `1.1f32`
    /// is stored as `1.1` rather than `1.100000023841858`. Non-finite values
    /// are widened as-is.
    pub fn append_f32(&mut self, v: f32) -> Idx {
        self.append_float(widen_f32(v))
    }

    /// Append a string node holding a copy of `v`
    pub fn append_string(&mut self, v: &str) -> Idx {
        self.push(Node::String(v.to_owned()))
    }

    /// Append a byte node holding a copy of `v`
    pub fn append_bytes(&mut self, v: &[u8]) -> Idx {
        self.push(Node::Bytes(v.to_vec()))
    }

    // -------------------- Keys --------------------

    fn table_mut(&mut self, op: &str) -> &mut StringTable {
        match self.strings.as_mut() {
            Some(table) => table,
            None => panic!("ArenaBuilder::{op}: no StringTable attached; call use_string_table first"),
        }
    }

    /// Intern `key` in the attached string table
    pub fn intern(&mut self, key: &str) -> KeyId {
        self.table_mut("intern").intern(key)
    }

    /// Build a field from a raw key, interning it
    pub fn field(&mut self, key: &str, value: Idx) -> Field {
        Field::new(self.table_mut("field").intern(key), value)
    }

    fn check_child(&self, op: &str, idx: Idx) {
        if idx.index() >= self.arena.len() {
            panic!(
                "ArenaBuilder::{op}: {idx} was not produced in this cycle (arena length {})",
                self.arena.len()
            );
        }
    }

    fn close(&mut self, scope: Scope, op: &str) {
        match self.scopes.pop() {
            Some(open) if open == scope => {}
            Some(open) => panic!("ArenaBuilder::{op}: innermost open scope is {open:?}"),
            None => panic!("ArenaBuilder::{op}: no open {scope:?} to end"),
        }
    }

    // -------------------- Objects --------------------

    /// Open an object
    pub fn object_start(&mut self) {
        self.scopes.push(Scope::Object);
        self.fields.open();
    }

    /// Open an object whose next `n` fields will not reallocate scratch
    pub fn object_start_reserve(&mut self, n: usize) {
        self.scopes.push(Scope::Object);
        self.fields.open_reserve(n);
    }

    /// Add a field to the innermost open object.
    ///
    /// Panics if no string table is attached or `field.key` was not produced
    /// by it.
    pub fn object_add(&mut self, field: Field) {
        match self.strings.as_ref() {
            Some(table) if table.contains_id(field.key) => {}
            Some(table) => panic!(
                "ArenaBuilder::object_add: key id {} unknown to the attached StringTable ({} keys)",
                field.key.get(),
                table.len()
            ),
            None => {
                panic!("ArenaBuilder::object_add: no StringTable attached; call use_string_table first")
            }
        }
        self.check_child("object_add", field.value);
        if self.scopes.last() != Some(&Scope::Object) {
            panic!("ArenaBuilder::object_add: innermost open scope is not an object");
        }
        self.fields.push(field);
    }

    /// Add a field by raw key
    pub fn object_add_key(&mut self, key: &str, value: Idx) {
        let field = self.field(key, value);
        self.object_add(field);
    }

    /// Add a field by an id previously returned from [`intern`](Self::intern)
    pub fn object_add_key_id(&mut self, key: KeyId, value: Idx) {
        self.object_add(Field::new(key, value));
    }

    /// Add a field only when `value` is present; absent values leave no
    /// trace in the object.
    pub fn object_add_optional(&mut self, key: &str, value: Option<Idx>) {
        if let Some(value) = value {
            self.object_add_key(key, value);
        }
    }

    /// Close the innermost object and append it.
    ///
    /// Panics when the innermost open scope is not an object.
    pub fn object_end(&mut self) -> Idx {
        self.close(Scope::Object, "object_end");
        let span = match self.fields.close_into(&mut self.frozen_fields) {
            Some(span) => span,
            None => panic!("ArenaBuilder::object_end: field scratch has no open scope"),
        };
        self.push(Node::Object(span))
    }

    // -------------------- Arrays --------------------

    /// Open an array
    pub fn array_start(&mut self) {
        self.scopes.push(Scope::Array);
        self.elements.open();
    }

    /// Open an array whose next `n` elements will not reallocate scratch
    pub fn array_start_reserve(&mut self, n: usize) {
        self.scopes.push(Scope::Array);
        self.elements.open_reserve(n);
    }

    /// Add an element to the innermost open array
    pub fn array_add(&mut self, idx: Idx) {
        self.check_child("array_add", idx);
        if self.scopes.last() != Some(&Scope::Array) {
            panic!("ArenaBuilder::array_add: innermost open scope is not an array");
        }
        self.elements.push(idx);
    }

    /// Close the innermost array and append it.
    ///
    /// Panics when the innermost open scope is not an array.
    pub fn array_end(&mut self) -> Idx {
        self.close(Scope::Array, "array_end");
        let span = match self.elements.close_into(&mut self.frozen_elements) {
            Some(span) => span,
            None => panic!("ArenaBuilder::array_end: element scratch has no open scope"),
        };
        self.push(Node::Array(span))
    }

    // -------------------- Finalize --------------------

    /// Borrowing batch over the current arena.
    ///
    /// The view cannot outlive the borrow of the builder, so it is
    /// necessarily consumed before the next reset.
    pub fn build_batch_view<'a>(&'a self, roots: &'a [Idx]) -> BatchView<'a> {
        for &root in roots {
            self.check_child("build_batch", root);
        }
        let strings = self.strings.as_ref().map(StringTable::keys).unwrap_or(&[]);
        tracing::trace!(
            nodes = self.arena.len(),
            keys = strings.len(),
            roots = roots.len(),
            "batch finalized"
        );
        BatchView::new(
            strings,
            &self.arena,
            self.frozen_fields.as_slice(),
            self.frozen_elements.as_slice(),
            roots,
        )
    }

    /// Deep-copied batch, independent of any later reset
    pub fn build_batch(&self, roots: &[Idx]) -> Batch {
        self.build_batch_view(roots).to_batch()
    }

    // -------------------- Inspection --------------------

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// All nodes in append order
    pub fn nodes(&self) -> &[Node] {
        &self.arena
    }

    /// Node at `idx`, if it exists
    pub fn get(&self, idx: Idx) -> Option<&Node> {
        self.arena.get(idx.index())
    }

    /// Node at `idx`; panics if it was not produced this cycle
    pub fn node(&self, idx: Idx) -> &Node {
        self.check_child("node", idx);
        &self.arena[idx.index()]
    }

    /// Fields of the object at `idx`, or `None` if it is not an object
    pub fn object_fields(&self, idx: Idx) -> Option<&[Field]> {
        self.node(idx)
            .as_object()
            .map(|span| self.frozen_fields.resolve(span))
    }

    /// Elements of the array at `idx`, or `None` if it is not an array
    pub fn array_elements(&self, idx: Idx) -> Option<&[Idx]> {
        self.node(idx)
            .as_array()
            .map(|span| self.frozen_elements.resolve(span))
    }

    /// Key text for `id` in the attached table
    pub fn key(&self, id: KeyId) -> Option<&str> {
        self.strings.as_ref().and_then(|table| table.get(id))
    }

    /// Number of open objects and arrays
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Children staged in scratch across all open scopes
    pub fn scratch_len(&self) -> usize {
        self.fields.len() + self.elements.len()
    }

    /// Children frozen so far this cycle
    pub fn frozen_len(&self) -> usize {
        self.frozen_fields.len() + self.frozen_elements.len()
    }
}

fn widen_f32(v: f32) -> f64 {
    if !v.is_finite() {
        return f64::from(v);
    }
    v.to_string().parse().unwrap_or(f64::from(v))
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
