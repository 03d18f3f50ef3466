/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The data-binding arena passed to a template's `Execute`, spec section
//! 3/4.1.
//!
//! Shaped like [`crate::yaml::tree::YamlDocument`]: a `SlotMap` arena of
//! nodes addressed by id rather than an owned recursive enum, so that two
//! fields of the caller's data can share one subtree, or a subtree can
//! reference an ancestor, without a smart pointer. The data mutator
//! ([`crate::data::mutator`]) depends on this: memoizing by `ValueId`
//! only preserves sharing/cycles if sharing is expressed as id reuse in
//! the first place.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifier for a node within a [`Data`]'s arena.
    pub struct ValueId;
}

/// A single node of caller-supplied template data.
#[derive(Debug, Clone)]
pub enum Value
{
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<ValueId>),
    /// Field order is preserved as inserted; `range` over a mapping
    /// iterates in this order, matching the teacher's own
    /// insertion-ordered collections elsewhere in this crate.
    Map(Vec<(String, ValueId)>),
}

impl Value
{
    pub(crate) fn as_str(&self) -> Option<&str>
    {
        match self
        {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub(crate) fn is_truthy(&self) -> bool
    {
        match self
        {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }
}

/// Caller data bound to a template execution: an arena plus the id of
/// its top-level value.
#[derive(Debug, Clone)]
pub struct Data
{
    arena: SlotMap<ValueId, Value>,
    root:  ValueId,
}

impl Data
{
    pub(crate) fn new(arena: SlotMap<ValueId, Value>, root: ValueId) -> Self
    {
        Self { arena, root }
    }

    pub fn root(&self) -> ValueId
    {
        self.root
    }

    pub fn node(&self, id: ValueId) -> &Value
    {
        &self.arena[id]
    }

    pub(crate) fn insert(&mut self, value: Value) -> ValueId
    {
        self.arena.insert(value)
    }

    /// Look up a field by name on the mapping at `id`. Returns `None`
    /// both when `id` is not a mapping and when the field is absent;
    /// Go's `text/template` makes the same no-distinction choice for
    /// missing map keys.
    pub(crate) fn field(&self, id: ValueId, name: &str) -> Option<ValueId>
    {
        match self.node(id)
        {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == name).map(|(_, v)| *v),
            _ => None,
        }
    }

    pub(crate) fn index(&self, id: ValueId, i: usize) -> Option<ValueId>
    {
        match self.node(id)
        {
            Value::Seq(items) => items.get(i).copied(),
            _ => None,
        }
    }

    pub(crate) fn len(&self, id: ValueId) -> Option<usize>
    {
        match self.node(id)
        {
            Value::Seq(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

/// Builder used by [`crate::data::from_serde`] and by tests to construct
/// a [`Data`] without hand-managing the arena.
#[derive(Debug, Default)]
pub struct DataBuilder
{
    arena: SlotMap<ValueId, Value>,
}

impl DataBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn insert(&mut self, value: Value) -> ValueId
    {
        self.arena.insert(value)
    }

    /// Overwrites an already-inserted slot. Used to close a cycle: insert
    /// a placeholder, insert the node that should reference it, then
    /// rewrite the placeholder's slot to point back.
    pub fn set(&mut self, id: ValueId, value: Value)
    {
        self.arena[id] = value;
    }

    pub fn get(&self, id: ValueId) -> &Value
    {
        &self.arena[id]
    }

    pub fn finish(self, root: ValueId) -> Data
    {
        Data::new(self.arena, root)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn shared_subtree_is_one_node()
    {
        let mut b = DataBuilder::new();
        let shared = b.insert(Value::Str("shared".into()));
        let seq = b.insert(Value::Seq(vec![shared, shared]));
        let data = b.finish(seq);

        let Value::Seq(items) = data.node(seq)
        else
        {
            panic!("expected sequence")
        };

        assert_eq!(items[0], items[1]);
    }

    #[test]
    fn self_reference_is_a_cycle()
    {
        let mut b = DataBuilder::new();
        let placeholder = b.insert(Value::Null);
        let wrapped = b.insert(Value::Map(vec![("self".into(), placeholder)]));
        b.set(placeholder, Value::Map(vec![("self".into(), wrapped)]));

        let data = b.finish(wrapped);

        let Value::Map(entries) = data.node(wrapped)
        else
        {
            panic!("expected mapping")
        };

        let (_, inner) = entries[0];

        assert_eq!(inner, placeholder);
        assert!(matches!(data.node(inner), Value::Map(_)));
    }
}
