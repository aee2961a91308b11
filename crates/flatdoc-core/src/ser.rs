//! Serde bridge: append any `Serialize` value to the arena
//!
//! The mapping mirrors serde_json so that decoding the arena reproduces
//! `serde_json::to_string` output:
//!
//! - unit, unit structs and `None` become `Null`
//! - unit variants become their name as a string
//! - newtype, tuple and struct variants become a one-field object keyed by
//!   the variant name
//! - map keys must be strings, chars, integers, finite floats, bools or unit
//!   variants; non-string keys are stringified
//! - byte slices become `Bytes` nodes (serde_json would emit an integer array)
//! - integers outside `i64` are rejected

use serde::{
    Serialize,
    ser::{self, Impossible},
};

use crate::{
    Error, Result,
    builder::ArenaBuilder,
    node::{Idx, KeyId},
};

/// Append `value` to `builder` and return its root index.
///
/// On error the builder may hold unclosed scopes and orphan nodes; reset it
/// before reuse. Serializing a struct or map requires an attached string
/// table.
pub fn to_arena<T: Serialize + ?Sized>(builder: &mut ArenaBuilder, value: &T) -> Result<Idx> {
    value.serialize(ArenaSerializer::new(builder))
}

/// Serializer whose output is the index of the appended root node
pub struct ArenaSerializer<'b> {
    builder: &'b mut ArenaBuilder,
}

impl<'b> ArenaSerializer<'b> {
    /// Serialize into `builder`
    pub fn new(builder: &'b mut ArenaBuilder) -> Self {
        Self { builder }
    }
}

fn int_node(builder: &mut ArenaBuilder, value: impl TryInto<i64> + ToString + Copy) -> Result<Idx> {
    match value.try_into() {
        Ok(v) => Ok(builder.append_int(v)),
        Err(_) => Err(Error::IntegerOutOfRange(value.to_string())),
    }
}

impl<'b> ser::Serializer for ArenaSerializer<'b> {
    type Ok = Idx;
    type Error = Error;

    type SerializeSeq = SerializeArray<'b>;
    type SerializeTuple = SerializeArray<'b>;
    type SerializeTupleStruct = SerializeArray<'b>;
    type SerializeTupleVariant = SerializeTupleVariant<'b>;
    type SerializeMap = SerializeMap<'b>;
    type SerializeStruct = SerializeStruct<'b>;
    type SerializeStructVariant = SerializeStructVariant<'b>;

    #[inline]
    fn serialize_bool(self, v: bool) -> Result<Idx> {
        Ok(self.builder.append_bool(v))
    }

    #[inline]
    fn serialize_i8(self, v: i8) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    #[inline]
    fn serialize_i16(self, v: i16) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    #[inline]
    fn serialize_i32(self, v: i32) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    #[inline]
    fn serialize_i64(self, v: i64) -> Result<Idx> {
        Ok(self.builder.append_int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Idx> {
        int_node(self.builder, v)
    }

    #[inline]
    fn serialize_u8(self, v: u8) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    #[inline]
    fn serialize_u16(self, v: u16) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    #[inline]
    fn serialize_u32(self, v: u32) -> Result<Idx> {
        Ok(self.builder.append_int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Idx> {
        int_node(self.builder, v)
    }

    fn serialize_u128(self, v: u128) -> Result<Idx> {
        int_node(self.builder, v)
    }

    #[inline]
    fn serialize_f32(self, v: f32) -> Result<Idx> {
        Ok(self.builder.append_f32(v))
    }

    #[inline]
    fn serialize_f64(self, v: f64) -> Result<Idx> {
        Ok(self.builder.append_float(v))
    }

    fn serialize_char(self, v: char) -> Result<Idx> {
        let mut buf = [0u8; 4];
        Ok(self.builder.append_string(v.encode_utf8(&mut buf)))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<Idx> {
        Ok(self.builder.append_string(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Idx> {
        Ok(self.builder.append_bytes(v))
    }

    #[inline]
    fn serialize_none(self) -> Result<Idx> {
        Ok(self.builder.append_null())
    }

    #[inline]
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Idx> {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<Idx> {
        Ok(self.builder.append_null())
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Idx> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Idx> {
        self.serialize_str(variant)
    }

    #[inline]
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Idx> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Idx> {
        self.builder.object_start_reserve(1);
        let inner = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.object_add_key(variant, inner);
        Ok(self.builder.object_end())
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeArray<'b>> {
        self.builder.array_start_reserve(len.unwrap_or(0));
        Ok(SerializeArray {
            builder: self.builder,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeArray<'b>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeArray<'b>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant<'b>> {
        self.builder.object_start_reserve(1);
        self.builder.array_start_reserve(len);
        Ok(SerializeTupleVariant {
            builder: self.builder,
            variant,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap<'b>> {
        self.builder.object_start_reserve(len.unwrap_or(0));
        Ok(SerializeMap {
            builder: self.builder,
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeStruct<'b>> {
        self.builder.object_start_reserve(len);
        Ok(SerializeStruct {
            builder: self.builder,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant<'b>> {
        self.builder.object_start_reserve(1);
        self.builder.object_start_reserve(len);
        Ok(SerializeStructVariant {
            builder: self.builder,
            variant,
        })
    }
}

/// Sequences and tuples
pub struct SerializeArray<'b> {
    builder: &'b mut ArenaBuilder,
}

impl SerializeArray<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let idx = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.array_add(idx);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeArray<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Idx> {
        Ok(self.builder.array_end())
    }
}

impl ser::SerializeTuple for SerializeArray<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Idx> {
        Ok(self.builder.array_end())
    }
}

impl ser::SerializeTupleStruct for SerializeArray<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Idx> {
        Ok(self.builder.array_end())
    }
}

/// `{"Variant":[...]}`
pub struct SerializeTupleVariant<'b> {
    builder: &'b mut ArenaBuilder,
    variant: &'static str,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let idx = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.array_add(idx);
        Ok(())
    }

    fn end(self) -> Result<Idx> {
        let elements = self.builder.array_end();
        self.builder.object_add_key(self.variant, elements);
        Ok(self.builder.object_end())
    }
}

/// Maps with stringifiable keys
pub struct SerializeMap<'b> {
    builder: &'b mut ArenaBuilder,
    pending_key: Option<KeyId>,
}

impl ser::SerializeMap for SerializeMap<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let id = key.serialize(MapKeySerializer {
            builder: &mut *self.builder,
        })?;
        self.pending_key = Some(id);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let Some(key) = self.pending_key.take() else {
            return Err(Error::serialize("map value serialized before its key"));
        };
        let idx = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.object_add_key_id(key, idx);
        Ok(())
    }

    fn end(self) -> Result<Idx> {
        Ok(self.builder.object_end())
    }
}

/// Structs
pub struct SerializeStruct<'b> {
    builder: &'b mut ArenaBuilder,
}

impl ser::SerializeStruct for SerializeStruct<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let idx = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.object_add_key(key, idx);
        Ok(())
    }

    fn end(self) -> Result<Idx> {
        Ok(self.builder.object_end())
    }
}

/// `{"Variant":{...}}`
pub struct SerializeStructVariant<'b> {
    builder: &'b mut ArenaBuilder,
    variant: &'static str,
}

impl ser::SerializeStructVariant for SerializeStructVariant<'_> {
    type Ok = Idx;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let idx = value.serialize(ArenaSerializer::new(&mut *self.builder))?;
        self.builder.object_add_key(key, idx);
        Ok(())
    }

    fn end(self) -> Result<Idx> {
        let inner = self.builder.object_end();
        self.builder.object_add_key(self.variant, inner);
        Ok(self.builder.object_end())
    }
}

/// Interns map keys, stringifying the scalar kinds serde_json accepts
struct MapKeySerializer<'b> {
    builder: &'b mut ArenaBuilder,
}

impl MapKeySerializer<'_> {
    fn display(self, v: impl ToString) -> Result<KeyId> {
        Ok(self.builder.intern(&v.to_string()))
    }

    /// Float keys use serde_json's own number text
    fn float(self, text: serde_json::Result<String>) -> Result<KeyId> {
        let text = text.map_err(|err| Error::serialize(err.to_string()))?;
        Ok(self.builder.intern(&text))
    }
}

impl ser::Serializer for MapKeySerializer<'_> {
    type Ok = KeyId;
    type Error = Error;

    type SerializeSeq = Impossible<KeyId, Error>;
    type SerializeTuple = Impossible<KeyId, Error>;
    type SerializeTupleStruct = Impossible<KeyId, Error>;
    type SerializeTupleVariant = Impossible<KeyId, Error>;
    type SerializeMap = Impossible<KeyId, Error>;
    type SerializeStruct = Impossible<KeyId, Error>;
    type SerializeStructVariant = Impossible<KeyId, Error>;

    fn serialize_str(self, v: &str) -> Result<KeyId> {
        Ok(self.builder.intern(v))
    }

    fn serialize_char(self, v: char) -> Result<KeyId> {
        let mut buf = [0u8; 4];
        Ok(self.builder.intern(v.encode_utf8(&mut buf)))
    }

    fn serialize_bool(self, v: bool) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_i8(self, v: i8) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_i16(self, v: i16) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_i32(self, v: i32) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_i64(self, v: i64) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_i128(self, v: i128) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_u8(self, v: u8) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_u16(self, v: u16) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_u32(self, v: u32) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_u64(self, v: u64) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_u128(self, v: u128) -> Result<KeyId> {
        self.display(v)
    }

    fn serialize_f32(self, v: f32) -> Result<KeyId> {
        if !v.is_finite() {
            return Err(Error::serialize("float key must be finite"));
        }
        self.float(serde_json::to_string(&v))
    }

    fn serialize_f64(self, v: f64) -> Result<KeyId> {
        if !v.is_finite() {
            return Err(Error::serialize("float key must be finite"));
        }
        self.float(serde_json::to_string(&v))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<KeyId> {
        Err(Error::KeyMustBeString("bytes"))
    }

    fn serialize_none(self) -> Result<KeyId> {
        Err(Error::KeyMustBeString("none"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<KeyId> {
        Err(Error::KeyMustBeString("option"))
    }

    fn serialize_unit(self) -> Result<KeyId> {
        Err(Error::KeyMustBeString("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<KeyId> {
        Err(Error::KeyMustBeString("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<KeyId> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<KeyId> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<KeyId> {
        Err(Error::KeyMustBeString("newtype variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::KeyMustBeString("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::KeyMustBeString("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::KeyMustBeString("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::KeyMustBeString("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::KeyMustBeString("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::KeyMustBeString("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::KeyMustBeString("struct variant"))
    }
}
