/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The data mutator, spec section 4.1.
//!
//! Produces a deep copy of a [`Data`] graph with every reachable string
//! passed through a transform, while preserving sharing and cycles: a
//! node visited twice (because two parents reference the same id) is
//! mutated once and the copy is reused, via a `ValueId -> ValueId` memo
//! table keyed on the *source* arena's identity.
//!
//! The memo slot for a node is reserved before recursing into its
//! children, so a cycle resolves to the in-progress copy rather than
//! recursing forever.

use slotmap::SecondaryMap;

use crate::data::value::{Data, DataBuilder, Value, ValueId};

/// Rewrites every string reachable from `data`'s root through `transform`,
/// returning a new, structurally identical (modulo string content) graph
/// alongside the `ValueId -> ValueId` map from each source node to its
/// copy, so a caller holding an id into `data` can find the matching
/// node in the result.
pub(crate) fn mutate(
    data: &Data,
    transform: &dyn Fn(&str) -> String,
) -> (Data, SecondaryMap<ValueId, ValueId>)
{
    let mut builder = DataBuilder::new();
    let mut memo: SecondaryMap<ValueId, ValueId> = SecondaryMap::new();

    let root = mutate_node(data, data.root(), &mut builder, &mut memo, transform);

    (builder.finish(root), memo)
}

fn mutate_node(
    data: &Data,
    id: ValueId,
    out: &mut DataBuilder,
    memo: &mut SecondaryMap<ValueId, ValueId>,
    transform: &dyn Fn(&str) -> String,
) -> ValueId
{
    if let Some(&done) = memo.get(id)
    {
        return done;
    }

    // Reserve the slot before touching children so a self- or mutually-
    // referential structure finds this entry already memoized instead of
    // recursing without end.
    let placeholder = out.insert(Value::Null);
    memo.insert(id, placeholder);

    let mutated = match data.node(id)
    {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Int(i) => Value::Int(*i),
        Value::Float(f) => Value::Float(*f),
        Value::Str(s) => Value::Str(transform(s)),
        Value::Seq(items) =>
        {
            let items = items
                .iter()
                .map(|&child| mutate_node(data, child, out, memo, transform))
                .collect();

            Value::Seq(items)
        },
        Value::Map(entries) =>
        {
            let entries = entries
                .iter()
                .map(|(key, child)| {
                    let key = transform(key);
                    let child = mutate_node(data, *child, out, memo, transform);

                    (key, child)
                })
                .collect();

            Value::Map(entries)
        },
    };

    out.set(placeholder, mutated);

    placeholder
}

/// Doubles every character in `s`. The spec's canonical string mutation:
/// cheap, reversible in spirit (doesn't need to be actually reversible),
/// and guaranteed to change length so accidental byte-for-byte equality
/// with the honest rendering can't mask a real structural change.
pub(crate) fn double_runes(s: &str) -> String
{
    let mut out = String::with_capacity(s.len() * 2);

    for c in s.chars()
    {
        out.push(c);
        out.push(c);
    }

    out
}

/// Replaces every reachable string with a single fixed placeholder,
/// collapsing all caller data down to the shape the template itself
/// imposes. Used for the baseline rendering.
pub(crate) fn placeholder(_s: &str) -> String
{
    "PLACEHOLDER".to_string()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::data::value::DataBuilder;

    #[test]
    fn doubles_every_string_leaf()
    {
        let mut b = DataBuilder::new();
        let leaf = b.insert(Value::Str("ab".into()));
        let seq = b.insert(Value::Seq(vec![leaf]));
        let data = b.finish(seq);

        let (mutated, _) = mutate(&data, &double_runes);

        let Value::Seq(items) = mutated.node(mutated.root())
        else
        {
            panic!("expected sequence")
        };

        assert_eq!(mutated.node(items[0]).as_str(), Some("aabb"));
    }

    #[test]
    fn shared_node_mutated_once_and_reused()
    {
        let mut b = DataBuilder::new();
        let shared = b.insert(Value::Str("x".into()));
        let seq = b.insert(Value::Seq(vec![shared, shared]));
        let data = b.finish(seq);

        let (mutated, _) = mutate(&data, &double_runes);

        let Value::Seq(items) = mutated.node(mutated.root())
        else
        {
            panic!("expected sequence")
        };

        assert_eq!(items[0], items[1]);
    }

    #[test]
    fn cycle_does_not_recurse_forever()
    {
        let mut b = DataBuilder::new();
        let placeholder_id = b.insert(Value::Null);
        let wrapped = b.insert(Value::Map(vec![("self".into(), placeholder_id)]));
        b.set(placeholder_id, Value::Map(vec![("self".into(), wrapped)]));
        let data = b.finish(wrapped);

        let (mutated, _) = mutate(&data, &double_runes);

        let Value::Map(entries) = mutated.node(mutated.root())
        else
        {
            panic!("expected mapping")
        };

        let (_, inner) = entries[0];

        assert!(matches!(mutated.node(inner), Value::Map(_)));
    }

    #[test]
    fn returned_map_resolves_source_ids_to_copies()
    {
        let mut b = DataBuilder::new();
        let leaf = b.insert(Value::Str("ab".into()));
        let seq = b.insert(Value::Seq(vec![leaf]));
        let data = b.finish(seq);

        let (mutated, map) = mutate(&data, &double_runes);

        let copied_leaf = *map.get(leaf).unwrap();

        assert_eq!(mutated.node(copied_leaf).as_str(), Some("aabb"));
    }
}
