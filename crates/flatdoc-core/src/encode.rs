//! Direct encoding of Rust values into the arena
//!
//! [`ArenaEncode`] is what generated per-type code implements: each impl
//! appends its nodes and returns the root index. It never fails, so it is
//! only implemented for types whose every value maps onto the node set;
//! `u64`, `usize` and 128-bit integers go through [`to_arena`](crate::to_arena)
//! instead, which reports out-of-range values.

use std::collections::{BTreeMap, HashMap};

use crate::{builder::ArenaBuilder, node::Idx};

/// A value that can append itself to an [`ArenaBuilder`]
pub trait ArenaEncode {
    /// Append nodes for `self` and return the root node index
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx;
}

/// Byte blob wrapper, encoded as a `Bytes` node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob<'a>(pub &'a [u8]);

impl ArenaEncode for Blob<'_> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_bytes(self.0)
    }
}

impl ArenaEncode for bool {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_bool(*self)
    }
}

macro_rules! encode_as_int {
    ($($ty:ty),* $(,)?) => {$(
        impl ArenaEncode for $ty {
            fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
                builder.append_int(i64::from(*self))
            }
        }
    )*};
}

encode_as_int!(i8, i16, i32, i64, u8, u16, u32);

impl ArenaEncode for f32 {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_f32(*self)
    }
}

impl ArenaEncode for f64 {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_float(*self)
    }
}

impl ArenaEncode for char {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        let mut buf = [0u8; 4];
        builder.append_string(self.encode_utf8(&mut buf))
    }
}

impl ArenaEncode for str {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_string(self)
    }
}

impl ArenaEncode for String {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        builder.append_string(self)
    }
}

impl<T: ArenaEncode + ?Sized> ArenaEncode for &T {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        (**self).append_to_arena(builder)
    }
}

impl<T: ArenaEncode + ?Sized> ArenaEncode for Box<T> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        (**self).append_to_arena(builder)
    }
}

/// `None` encodes as `Null`. To drop an absent field from its object
/// instead, use [`append_optional_field`].
impl<T: ArenaEncode> ArenaEncode for Option<T> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        match self {
            Some(value) => value.append_to_arena(builder),
            None => builder.append_null(),
        }
    }
}

impl<T: ArenaEncode> ArenaEncode for [T] {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        append_slice(builder, self)
    }
}

impl<T: ArenaEncode> ArenaEncode for Vec<T> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        append_slice(builder, self)
    }
}

impl<T: ArenaEncode> ArenaEncode for BTreeMap<String, T> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        append_string_map(builder, self)
    }
}

/// Fields follow the map's iteration order, which is unspecified.
impl<T: ArenaEncode, S> ArenaEncode for HashMap<String, T, S> {
    fn append_to_arena(&self, builder: &mut ArenaBuilder) -> Idx {
        append_string_map(builder, self)
    }
}

/// Append an array with one element per item
pub fn append_slice<T: ArenaEncode>(builder: &mut ArenaBuilder, items: &[T]) -> Idx {
    builder.array_start_reserve(items.len());
    for item in items {
        let idx = item.append_to_arena(builder);
        builder.array_add(idx);
    }
    builder.array_end()
}

/// Append an object with one field per entry, in iteration order
pub fn append_string_map<'a, K, T, I>(builder: &mut ArenaBuilder, entries: I) -> Idx
where
    K: AsRef<str> + 'a,
    T: ArenaEncode + 'a,
    I: IntoIterator<Item = (&'a K, &'a T)>,
{
    builder.object_start();
    for (key, value) in entries {
        let idx = value.append_to_arena(builder);
        builder.object_add_key(key.as_ref(), idx);
    }
    builder.object_end()
}

/// Append `value` and add it to the innermost open object under `key`
pub fn append_field<T: ArenaEncode + ?Sized>(builder: &mut ArenaBuilder, key: &str, value: &T) {
    let idx = value.append_to_arena(builder);
    builder.object_add_key(key, idx);
}

/// Like [`append_field`], but an absent value adds no field at all
pub fn append_optional_field<T: ArenaEncode>(
    builder: &mut ArenaBuilder,
    key: &str,
    value: Option<&T>,
) {
    let idx = value.map(|v| v.append_to_arena(builder));
    builder.object_add_optional(key, idx);
}
