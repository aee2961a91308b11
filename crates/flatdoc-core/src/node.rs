//! Node model of the arena
//!
//! Every cross-reference is an integer offset: nodes point at other nodes with
//! [`Idx`], object fields name their key with [`KeyId`], and compound nodes
//! hold a [`FrozenSpan`] into the frozen child storage of their build cycle.

use serde::{Deserialize, Serialize};
use std::{fmt, marker::PhantomData};

/// Offset of a node in the arena of the current build cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Idx(u32);

impl Idx {
    /// Wrap a raw arena offset
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw offset value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Offset as a slice index
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<Idx> for u32 {
    fn from(idx: Idx) -> Self {
        idx.0
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interned key id produced by a [`StringTable`](crate::StringTable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(u32);

impl KeyId {
    /// Wrap a raw key id
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Id as a slice index into the key sequence
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One object member: interned key plus value node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Interned key
    pub key: KeyId,
    /// Value node
    pub value: Idx,
}

impl Field {
    /// Create a field from an interned key and a value index
    pub const fn new(key: KeyId, value: Idx) -> Self {
        Self { key, value }
    }
}

/// Range `[start, start + len)` inside frozen child storage.
///
/// Only [`Frozen`](crate::assembly::Frozen) hands these out, so a finished
/// node can never describe its children in terms of scratch memory.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FrozenSpan<T> {
    start: u32,
    len: u32,
    #[serde(skip)]
    marker: PhantomData<fn() -> T>,
}

/// Children of an object node
pub type FieldSpan = FrozenSpan<Field>;

/// Children of an array node
pub type ElementSpan = FrozenSpan<Idx>;

impl<T> FrozenSpan<T> {
    pub(crate) const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            marker: PhantomData,
        }
    }

    /// First slot of the span
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Number of children
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Whether the span has no children
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot one past the end, widened so corrupt spans cannot overflow
    pub const fn end(&self) -> u64 {
        self.start as u64 + self.len as u64
    }
}

// Manual impls: derives would demand `T: Clone` etc. for a phantom parameter.
impl<T> Clone for FrozenSpan<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FrozenSpan<T> {}

impl<T> PartialEq for FrozenSpan<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len
    }
}

impl<T> Eq for FrozenSpan<T> {}

impl<T> fmt::Debug for FrozenSpan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrozenSpan[{}..{}]", self.start, self.end())
    }
}

/// A single value stored in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// JSON null
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit IEEE float
    Float(f64),
    /// Owned text
    String(String),
    /// Owned byte blob
    Bytes(Vec<u8>),
    /// Ordered element indices
    Array(ElementSpan),
    /// Ordered fields, insertion order preserved
    Object(FieldSpan),
}

impl Node {
    /// Short variant name, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Boolean(_) => "boolean",
            Node::Integer(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Bytes(_) => "bytes",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// Check if node is null
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Get value as bool if it's a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get value as i64 if it's an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get value as f64 if it's a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get value as str if it's a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get value as bytes if it's a byte blob
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Node::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Element span if it's an array
    pub fn as_array(&self) -> Option<ElementSpan> {
        match self {
            Node::Array(span) => Some(*span),
            _ => None,
        }
    }

    /// Field span if it's an object
    pub fn as_object(&self) -> Option<FieldSpan> {
        match self {
            Node::Object(span) => Some(*span),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_accessors() {
        assert!(Node::Null.is_null());
        assert_eq!(Node::Boolean(true).as_bool(), Some(true));
        assert_eq!(Node::Integer(-4).as_i64(), Some(-4));
        assert_eq!(Node::Float(3.5).as_f64(), Some(3.5));
        assert_eq!(Node::String("hi".into()).as_str(), Some("hi"));
        assert_eq!(Node::Bytes(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert!(Node::Integer(1).as_str().is_none());
        assert!(Node::Null.as_object().is_none());
    }

    #[test]
    fn test_node_kind() {
        assert_eq!(Node::Array(ElementSpan::new(0, 0)).kind(), "array");
        assert_eq!(Node::Object(FieldSpan::new(0, 2)).kind(), "object");
        assert_eq!(Node::Bytes(Vec::new()).kind(), "bytes");
    }

    #[test]
    fn test_span_bounds() {
        let span = FieldSpan::new(4, 3);
        assert_eq!(span.start(), 4);
        assert_eq!(span.len(), 3);
        assert_eq!(span.end(), 7);
        assert!(!span.is_empty());

        let wide = ElementSpan::new(u32::MAX, u32::MAX);
        assert_eq!(wide.end(), 2 * u32::MAX as u64);
    }

    #[test]
    fn test_idx_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Field::new(KeyId::new(2), Idx::new(9))).unwrap();
        assert_eq!(json, r#"{"key":2,"value":9}"#);
    }
}
