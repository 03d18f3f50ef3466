/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Bridges an arbitrary `serde::Serialize` value into a [`Data`] graph.
//!
//! `serde`'s data model has no notion of pointer identity, so a value
//! reached through this path is always a tree: sharing and cycles (see
//! [`crate::data::mutator`]) are only representable by building a
//! [`Data`] directly through [`crate::data::value::DataBuilder`]. This is
//! the common case -- most callers hand the facade an owned struct, not a
//! hand-built graph with back-references -- and the spec's collaborator
//! contract only requires that caller data be walkable, not that this
//! particular entry point preserve sharing it was never told about.

use serde::{ser, Serialize};

use crate::data::value::{Data, DataBuilder, Value, ValueId};

#[derive(Debug)]
pub struct FromSerdeError(String);

impl std::fmt::Display for FromSerdeError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "could not convert value into template data: {}", self.0)
    }
}

impl std::error::Error for FromSerdeError {}

impl ser::Error for FromSerdeError
{
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        FromSerdeError(msg.to_string())
    }
}

/// Converts any serializable value into template [`Data`].
pub fn from_serde<T>(value: &T) -> Result<Data, FromSerdeError>
where
    T: Serialize,
{
    let mut builder = DataBuilder::new();
    let root = value.serialize(Serializer { out: &mut builder })?;

    Ok(builder.finish(root))
}

struct Serializer<'a>
{
    out: &'a mut DataBuilder,
}

impl<'a> ser::Serializer for Serializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = SeqSerializer<'a>;
    type SerializeTupleVariant = SeqSerializer<'a>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = MapSerializer<'a>;
    type SerializeStructVariant = MapSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Int(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Result<ValueId, Self::Error>
    {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Int(v as i64)))
    }

    fn serialize_f32(self, v: f32) -> Result<ValueId, Self::Error>
    {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<ValueId, Self::Error>
    {
        self.serialize_str(&v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Str(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ValueId, Self::Error>
    {
        let items = v
            .iter()
            .map(|&b| self.out.insert(Value::Int(b as i64)))
            .collect();

        Ok(self.out.insert(Value::Seq(items)))
    }

    fn serialize_none(self) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Null))
    }

    fn serialize_some<T>(self, value: &T) -> Result<ValueId, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Null))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ValueId, Self::Error>
    {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ValueId, Self::Error>
    {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<ValueId, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ValueId, Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(Serializer { out: self.out })?;

        Ok(self.out.insert(Value::Map(vec![(variant.to_string(), inner)])))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error>
    {
        Ok(SeqSerializer {
            out:   self.out,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error>
    {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error>
    {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error>
    {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error>
    {
        Ok(MapSerializer {
            out:     self.out,
            entries: Vec::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error>
    {
        Ok(MapSerializer {
            out:     self.out,
            entries: Vec::with_capacity(len),
            pending_key: None,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error>
    {
        self.serialize_struct(_name, len)
    }
}

struct SeqSerializer<'a>
{
    out:   &'a mut DataBuilder,
    items: Vec<ValueId>,
}

impl<'a> ser::SerializeSeq for SeqSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let id = value.serialize(Serializer { out: self.out })?;
        self.items.push(id);

        Ok(())
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Seq(self.items)))
    }
}

impl<'a> ser::SerializeTuple for SeqSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleStruct for SeqSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleVariant for SeqSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        ser::SerializeSeq::end(self)
    }
}

struct MapSerializer<'a>
{
    out:         &'a mut DataBuilder,
    entries:     Vec<(String, ValueId)>,
    pending_key: Option<String>,
}

impl<'a> ser::SerializeMap for MapSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let id = key.serialize(Serializer { out: self.out })?;

        let key_text = match self.out.get(id)
        {
            Value::Str(s) => s.clone(),
            _ => return Err(FromSerdeError("map key did not serialize to a string".into())),
        };

        self.pending_key = Some(key_text);

        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .expect("serialize_value called without a preceding serialize_key");
        let id = value.serialize(Serializer { out: self.out })?;

        self.entries.push((key, id));

        Ok(())
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Map(self.entries)))
    }
}

impl<'a> ser::SerializeStruct for MapSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_field<T>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let id = value.serialize(Serializer { out: self.out })?;
        self.entries.push((key.to_string(), id));

        Ok(())
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        Ok(self.out.insert(Value::Map(self.entries)))
    }
}

impl<'a> ser::SerializeStructVariant for MapSerializer<'a>
{
    type Ok = ValueId;
    type Error = FromSerdeError;

    fn serialize_field<T>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<ValueId, Self::Error>
    {
        ser::SerializeStruct::end(self)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Address
    {
        city: String,
    }

    #[derive(Serialize)]
    struct Person
    {
        name:      String,
        age:       u32,
        addresses: Vec<Address>,
    }

    #[test]
    fn struct_becomes_mapping()
    {
        let person = Person {
            name:      "Ada".into(),
            age:       36,
            addresses: vec![Address {
                city: "London".into(),
            }],
        };

        let data = from_serde(&person).expect("serializes");

        let Value::Map(entries) = data.node(data.root())
        else
        {
            panic!("expected mapping")
        };

        let (_, name_id) = entries.iter().find(|(k, _)| k == "name").unwrap();
        assert_eq!(data.node(*name_id).as_str(), Some("Ada"));
    }
}
