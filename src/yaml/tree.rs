/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The YAML parse tree the structural equivalence judge compares.
//!
//! Built directly from the crate's own scanner/event pipeline via
//! [`event::driver::parse_str`](crate::event::driver::parse_str). Uses the
//! same arena shape as the (unfinished, never wired up) `node` module the
//! teacher crate shipped: a `SlotMap` of nodes plus a separate map of
//! per-document roots, rather than an owned recursive enum, so that alias
//! nodes can reference an earlier sibling by id without a smart pointer.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::event::{
    driver,
    error::ParseError,
    types::{Event, EventData},
};

new_key_type! {
    /// Identifier for a node within a single [`YamlDocument`]'s arena.
    pub(crate) struct NodeId;
}

/// A single node in a parsed YAML document.
#[derive(Debug, Clone)]
pub(crate) enum Node
{
    Scalar(String),
    Sequence(Vec<NodeId>),
    /// Mapping entries in source order. Keys are stored as nodes (not
    /// just strings) because the judge must be able to reject a
    /// non-scalar key; see [`crate::yaml::judge`].
    Mapping(Vec<(NodeId, NodeId)>),
    Alias(NodeId),
}

/// Coarse classification used throughout the judge; avoids matching on
/// [`Node`] (and thus cloning/inspecting payloads) when only shape
/// matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind
{
    Scalar,
    Sequence,
    Mapping,
    Alias,
}

impl Node
{
    pub(crate) fn kind(&self) -> NodeKind
    {
        match self
        {
            Node::Scalar(_) => NodeKind::Scalar,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Alias(_) => NodeKind::Alias,
        }
    }
}

/// One document from a YAML stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct YamlDocument
{
    nodes: SlotMap<NodeId, Node>,
    root:  Option<NodeId>,
}

impl YamlDocument
{
    pub(crate) fn node(&self, id: NodeId) -> &Node
    {
        &self.nodes[id]
    }

    pub(crate) fn root(&self) -> Option<NodeId>
    {
        self.root
    }

    /// Resolve an alias chain to the node it ultimately points at. Alias
    /// targets are never themselves aliases (the builder below resolves
    /// at insertion time), so this is a single lookup, but the helper
    /// keeps call sites honest about intent.
    pub(crate) fn resolve<'a>(&'a self, id: NodeId) -> (&'a Node, NodeId)
    {
        match self.node(id)
        {
            Node::Alias(target) => (self.node(*target), *target),
            other => (other, id),
        }
    }
}

/// Errors building a [`YamlDocument`] stream out of an [`Event`] sequence.
#[derive(Debug)]
pub(crate) enum TreeError
{
    Parse(ParseError),
    UndefinedAlias,
    /// The event stream ended inside an open mapping/sequence/document.
    Truncated,
}

impl From<ParseError> for TreeError
{
    fn from(e: ParseError) -> Self
    {
        TreeError::Parse(e)
    }
}

impl std::fmt::Display for TreeError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            TreeError::Parse(e) => write!(f, "{e}"),
            TreeError::UndefinedAlias => f.write_str("alias refers to an undefined anchor"),
            TreeError::Truncated => f.write_str("unexpected end of YAML event stream"),
        }
    }
}

/// Parse `src` into its stream of documents.
pub(crate) fn parse_documents(src: &str) -> Result<Vec<YamlDocument>, TreeError>
{
    let events = driver::parse_str(src)?;

    Builder::new(events).run()
}

struct Builder<'de>
{
    events:  std::vec::IntoIter<Event<'de>>,
    pending: Option<Event<'de>>,
}

impl<'de> Builder<'de>
{
    fn new(events: Vec<Event<'de>>) -> Self
    {
        Self {
            events:  events.into_iter(),
            pending: None,
        }
    }

    fn next(&mut self) -> Option<Event<'de>>
    {
        self.pending.take().or_else(|| self.events.next())
    }

    fn run(mut self) -> Result<Vec<YamlDocument>, TreeError>
    {
        let mut docs = Vec::new();

        loop
        {
            let event = match self.next()
            {
                Some(e) => e,
                None => break,
            };

            match event.data()
            {
                EventData::StreamStart(_) => continue,
                EventData::StreamEnd => break,
                EventData::DocumentStart(_) => docs.push(self.document()?),
                EventData::DocumentEnd(_) => continue,
                other => return Err(unexpected(other)),
            }
        }

        Ok(docs)
    }

    fn document(&mut self) -> Result<YamlDocument, TreeError>
    {
        let mut doc = YamlDocument::default();
        let mut anchors = HashMap::new();

        let root = loop
        {
            let mut event = self.next().ok_or(TreeError::Truncated)?;

            match take_event_data(&mut event)
            {
                EventData::DocumentEnd(_) => break None,
                EventData::Scalar(node) =>
                {
                    let text = node.content.evaluate().map_err(|_| TreeError::Truncated)?;
                    let id = doc.nodes.insert(Node::Scalar(text.data().to_string()));

                    if let Some(anchor) = node.anchor
                    {
                        anchors.insert(anchor.to_string(), id);
                    }

                    break Some(id);
                },
                EventData::Alias(alias) =>
                {
                    let target = *anchors
                        .get(alias.name.as_ref())
                        .ok_or(TreeError::UndefinedAlias)?;

                    let id = doc.nodes.insert(Node::Alias(target));

                    break Some(id);
                },
                EventData::SequenceStart(node) =>
                {
                    let anchor = node.anchor.clone();
                    let id = self.sequence(&mut doc, &mut anchors)?;

                    if let Some(anchor) = anchor
                    {
                        anchors.insert(anchor.to_string(), id);
                    }

                    break Some(id);
                },
                EventData::MappingStart(node) =>
                {
                    let anchor = node.anchor.clone();
                    let id = self.mapping(&mut doc, &mut anchors)?;

                    if let Some(anchor) = anchor
                    {
                        anchors.insert(anchor.to_string(), id);
                    }

                    break Some(id);
                },
                other => return Err(unexpected(&other)),
            }
        };

        doc.root = root;

        // Drain a trailing DocumentEnd if the root branch didn't consume
        // one (collections close on their own End event, not a shared
        // DocumentEnd).
        if root.is_some()
        {
            loop
            {
                match self.next()
                {
                    Some(e) => match e.data()
                    {
                        EventData::DocumentEnd(_) => break,
                        _ =>
                        {
                            self.pending = Some(e);
                            break;
                        },
                    },
                    None => break,
                }
            }
        }

        Ok(doc)
    }

    fn sequence(
        &mut self,
        doc: &mut YamlDocument,
        anchors: &mut HashMap<String, NodeId>,
    ) -> Result<NodeId, TreeError>
    {
        let mut items = Vec::new();

        loop
        {
            let mut event = self.next().ok_or(TreeError::Truncated)?;

            match take_event_data(&mut event)
            {
                EventData::SequenceEnd => break,
                other =>
                {
                    let id = self.node_from(other, doc, anchors)?;
                    items.push(id);
                },
            }
        }

        Ok(doc.nodes.insert(Node::Sequence(items)))
    }

    fn mapping(
        &mut self,
        doc: &mut YamlDocument,
        anchors: &mut HashMap<String, NodeId>,
    ) -> Result<NodeId, TreeError>
    {
        let mut entries = Vec::new();

        loop
        {
            let mut key_event = self.next().ok_or(TreeError::Truncated)?;

            if matches!(key_event.data(), EventData::MappingEnd)
            {
                break;
            }

            let key = self.node_from(take_event_data(&mut key_event), doc, anchors)?;

            let mut value_event = self.next().ok_or(TreeError::Truncated)?;
            let value = self.node_from(take_event_data(&mut value_event), doc, anchors)?;

            entries.push((key, value));
        }

        Ok(doc.nodes.insert(Node::Mapping(entries)))
    }

    /// Build a single node (and, recursively, its subtree) from an event
    /// already known not to be a collection terminator.
    fn node_from(
        &mut self,
        data: EventData<'de>,
        doc: &mut YamlDocument,
        anchors: &mut HashMap<String, NodeId>,
    ) -> Result<NodeId, TreeError>
    {
        match data
        {
            EventData::Scalar(node) =>
            {
                let text = node.content.evaluate().map_err(|_| TreeError::Truncated)?;
                let id = doc.nodes.insert(Node::Scalar(text.data().to_string()));

                if let Some(anchor) = node.anchor
                {
                    anchors.insert(anchor.to_string(), id);
                }

                Ok(id)
            },
            EventData::Alias(alias) =>
            {
                let target = *anchors
                    .get(alias.name.as_ref())
                    .ok_or(TreeError::UndefinedAlias)?;

                Ok(doc.nodes.insert(Node::Alias(target)))
            },
            EventData::SequenceStart(node) =>
            {
                let anchor = node.anchor.clone();
                let id = self.sequence(doc, anchors)?;

                if let Some(anchor) = anchor
                {
                    anchors.insert(anchor.to_string(), id);
                }

                Ok(id)
            },
            EventData::MappingStart(node) =>
            {
                let anchor = node.anchor.clone();
                let id = self.mapping(doc, anchors)?;

                if let Some(anchor) = anchor
                {
                    anchors.insert(anchor.to_string(), id);
                }

                Ok(id)
            },
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(data: &EventData<'_>) -> TreeError
{
    let _ = data;

    TreeError::Truncated
}

fn take_event_data<'de>(event: &mut Event<'de>) -> EventData<'de>
{
    std::mem::replace(event.data_mut(), EventData::StreamEnd)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn flat_mapping()
    {
        let docs = parse_documents("hello: world").expect("parses");

        assert_eq!(docs.len(), 1);

        let doc = &docs[0];
        let root = doc.root().expect("has root");

        match doc.node(root)
        {
            Node::Mapping(entries) =>
            {
                assert_eq!(entries.len(), 1);

                let (k, v) = entries[0];

                assert!(matches!(doc.node(k), Node::Scalar(s) if s == "hello"));
                assert!(matches!(doc.node(v), Node::Scalar(s) if s == "world"));
            },
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn alias_resolves()
    {
        let docs = parse_documents("{ secret: &a t, disclosed: *a }").expect("parses");
        let doc = &docs[0];
        let root = doc.root().unwrap();

        let Node::Mapping(entries) = doc.node(root)
        else
        {
            panic!("expected mapping")
        };

        let (_, disclosed) = entries[1];

        assert!(matches!(doc.node(disclosed), Node::Alias(_)));
    }

    #[test]
    fn undefined_alias_errors()
    {
        let err = parse_documents("a: *missing").unwrap_err();

        assert!(matches!(err, TreeError::UndefinedAlias));
    }
}
