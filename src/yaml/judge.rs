/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The YAML structural equivalence judge, spec section 4.4.
//!
//! Compares three renderings of the same template in lock-step: the
//! baseline (every data-access site replaced by a fixed placeholder), the
//! requested (the caller's real data), and the mutated (every reachable
//! input string rune-doubled). Any difference in document count, node
//! kind, mapping key set, sequence length, or a newly-introduced alias is
//! structural and rejected.

use std::collections::HashSet;

use crate::yaml::tree::{Node, NodeId, YamlDocument};

/// Outcome of a failed judgement. Almost everything is "the data changed
/// the shape of the document", but a key that is itself a mapping or
/// sequence is rejected as a template defect (spec.md 4.4), not as an
/// injection attempt, since no data substitution could have caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict
{
    Equivalent,
    Injection,
    InvalidTemplate,
}

pub(crate) fn judge(
    baseline: &[YamlDocument],
    requested: &[YamlDocument],
    mutated: &[YamlDocument],
) -> Verdict
{
    if baseline.len() != requested.len() || baseline.len() != mutated.len()
    {
        return Verdict::Injection;
    }

    for ((b, r), m) in baseline.iter().zip(requested).zip(mutated)
    {
        match judge_document(b, r, m)
        {
            Verdict::Equivalent =>
            {},
            other => return other,
        }
    }

    Verdict::Equivalent
}

fn judge_document(b: &YamlDocument, r: &YamlDocument, m: &YamlDocument) -> Verdict
{
    match (b.root(), r.root(), m.root())
    {
        (None, None, None) => Verdict::Equivalent,
        (Some(b_id), Some(r_id), Some(m_id)) =>
        {
            let walk = Walk { b, r, m };

            walk.node(b_id, r_id, m_id)
        },
        _ => Verdict::Injection,
    }
}

struct Walk<'a>
{
    b: &'a YamlDocument,
    r: &'a YamlDocument,
    m: &'a YamlDocument,
}

impl<'a> Walk<'a>
{
    fn node(&self, b_id: NodeId, r_id: NodeId, m_id: NodeId) -> Verdict
    {
        let (b_node, b_was_alias) = self.deref(self.b, b_id);
        let (r_node, r_was_alias) = self.deref(self.r, r_id);
        let (m_node, m_was_alias) = self.deref(self.m, m_id);

        // An alias that appears in requested/mutated but had no
        // counterpart alias in baseline at this position is a new
        // structural element: data introduced a reference the template
        // never had.
        if (r_was_alias || m_was_alias) && !b_was_alias
        {
            return Verdict::Injection;
        }

        let b_kind = b_node.kind();

        if b_kind != r_node.kind() || b_kind != m_node.kind()
        {
            return Verdict::Injection;
        }

        match (b_node, r_node, m_node)
        {
            (Node::Scalar(_), Node::Scalar(_), Node::Scalar(_)) => Verdict::Equivalent,
            (Node::Sequence(bs), Node::Sequence(rs), Node::Sequence(ms)) =>
            {
                if bs.len() != rs.len() || bs.len() != ms.len()
                {
                    return Verdict::Injection;
                }

                for ((b, r), m) in bs.iter().zip(rs).zip(ms)
                {
                    match self.node(*b, *r, *m)
                    {
                        Verdict::Equivalent =>
                        {},
                        other => return other,
                    }
                }

                Verdict::Equivalent
            },
            (Node::Mapping(be), Node::Mapping(re), Node::Mapping(me)) =>
            {
                self.judge_mapping(be, re, me)
            },
            (Node::Alias(_), Node::Alias(_), Node::Alias(_)) =>
            {
                unreachable!("deref above always follows alias chains to their target")
            },
            _ => unreachable!("kinds already checked equal above"),
        }
    }

    /// Dereferences an alias to the node it targets, reporting whether
    /// the original id *was* an alias, which the caller needs for the
    /// "new alias" rejection rule.
    fn deref<'d>(&self, doc: &'d YamlDocument, id: NodeId) -> (&'d Node, bool)
    {
        match doc.node(id)
        {
            Node::Alias(target) => (doc.node(*target), true),
            other => (other, false),
        }
    }

    fn judge_mapping(
        &self,
        be: &[(NodeId, NodeId)],
        re: &[(NodeId, NodeId)],
        me: &[(NodeId, NodeId)],
    ) -> Verdict
    {
        let b_keys = match self.canonical_keys(self.b, be)
        {
            Ok(k) => k,
            Err(v) => return v,
        };
        let r_keys = match self.canonical_keys(self.r, re)
        {
            Ok(k) => k,
            Err(v) => return v,
        };
        let m_keys = match self.canonical_keys(self.m, me)
        {
            Ok(k) => k,
            Err(v) => return v,
        };

        if has_duplicates(&b_keys) || has_duplicates(&r_keys) || has_duplicates(&m_keys)
        {
            return Verdict::Injection;
        }

        let b_set: HashSet<_> = b_keys.iter().map(|(k, _)| k.clone()).collect();
        let r_set: HashSet<_> = r_keys.iter().map(|(k, _)| k.clone()).collect();
        let m_set: HashSet<_> = m_keys.iter().map(|(k, _)| k.clone()).collect();

        if b_set != r_set || b_set != m_set
        {
            return Verdict::Injection;
        }

        // Same key set: pair entries up by key and recurse into values.
        for key in &b_set
        {
            let (_, b_val) = b_keys.iter().find(|(k, _)| k == key).unwrap();
            let (_, r_val) = r_keys.iter().find(|(k, _)| k == key).unwrap();
            let (_, m_val) = m_keys.iter().find(|(k, _)| k == key).unwrap();

            match self.node(*b_val, *r_val, *m_val)
            {
                Verdict::Equivalent =>
                {},
                other => return other,
            }
        }

        Verdict::Equivalent
    }

    /// Canonicalizes each key to its scalar text, rejecting any
    /// mapping/sequence used as a key outright as a template defect
    /// (spec.md 4.4: "a mapping or sequence appearing as a key fails the
    /// judge").
    fn canonical_keys(
        &self,
        doc: &YamlDocument,
        entries: &[(NodeId, NodeId)],
    ) -> Result<Vec<(String, NodeId)>, Verdict>
    {
        let mut out = Vec::with_capacity(entries.len());

        for (key_id, value_id) in entries
        {
            let (key_node, _) = self.deref(doc, *key_id);

            match key_node
            {
                Node::Scalar(text) => out.push((text.clone(), *value_id)),
                Node::Sequence(_) | Node::Mapping(_) => return Err(Verdict::InvalidTemplate),
                Node::Alias(_) => unreachable!("deref follows alias chains"),
            }
        }

        Ok(out)
    }
}

fn has_duplicates(keys: &[(String, NodeId)]) -> bool
{
    let mut seen = HashSet::with_capacity(keys.len());

    for (k, _) in keys
    {
        if !seen.insert(k.as_str())
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::yaml::tree::parse_documents;

    fn judge_sources(b: &str, r: &str, m: &str) -> Verdict
    {
        let b = parse_documents(b).expect("baseline parses");
        let r = parse_documents(r).expect("requested parses");
        let m = parse_documents(m).expect("mutated parses");

        judge(&b, &r, &m)
    }

    #[test]
    fn scalar_substitution_is_equivalent()
    {
        let v = judge_sources(
            "{ hello: PLACEHOLDER }",
            "{ hello: world }",
            "{ hello: wwoorrlldd }",
        );

        assert_eq!(v, Verdict::Equivalent);
    }

    #[test]
    fn extra_key_is_injection()
    {
        let v = judge_sources(
            "{ hello: PLACEHOLDER }",
            "{ hello: world, oops: true }",
            "{ hello: wwoorrlldd }",
        );

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn new_alias_is_injection()
    {
        let v = judge_sources(
            "{ secret: &a t, disclosed: PLACEHOLDER }",
            "{ secret: &a t, disclosed: *a }",
            "{ secret: &a t, disclosed: PPLLAACCEEHHOOLLDDEERR }",
        );

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn duplicate_keys_rejected()
    {
        let v = judge_sources(
            "{ a: PLACEHOLDER }",
            "{ a: 1, a: 2 }",
            "{ a: PPLLAACCEEHHOOLLDDEERR }",
        );

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn non_scalar_key_is_invalid_template()
    {
        let v = judge_sources(
            "{ a: PLACEHOLDER }",
            "{ ? [1, 2] : 3 }",
            "{ a: PPLLAACCEEHHOOLLDDEERR }",
        );

        assert_eq!(v, Verdict::InvalidTemplate);
    }

    #[test]
    fn mismatched_sequence_length_is_injection()
    {
        let v = judge_sources("[PLACEHOLDER]", "[1, 2]", "[PPLLAACCEEHHOOLLDDEERR]");

        assert_eq!(v, Verdict::Injection);
    }
}
