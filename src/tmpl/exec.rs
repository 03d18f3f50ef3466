/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Executes a parsed template against [`Data`] under a given
//! [`Policy`], spec section 4.2/4.5.
//!
//! Besides the rendered text, execution records a [`Span`] for every
//! leaf it printed along with the [`SiteMarker`] that was active there.
//! The shell judge (`crate::sh::judge`) needs this: the spec's
//! `AllowFlags` marker changes how a single call site's payload is
//! compared, which nothing about the rendered bytes alone can recover
//! after the fact.

use std::{collections::HashMap, fmt, ops::Range};

use slotmap::SecondaryMap;

use crate::{
    data::{
        mutator,
        value::{Data, Value, ValueId},
    },
    tmpl::{
        ast::{Command, Node, Pipeline, Term},
        policy::{marker_for, Policy, SiteMarker},
    },
};

#[derive(Debug)]
pub enum ExecError
{
    MissingField(String),
    UnknownFunction(String),
    UnknownTemplate(String),
    NotPrintable,
    NotIndexable,
    EmptyCommand,
    SentinelArity(String),
    Function(String, Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for ExecError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            ExecError::MissingField(name) => write!(f, "no field or key {name:?} in data"),
            ExecError::UnknownFunction(name) => write!(f, "unknown template function {name:?}"),
            ExecError::UnknownTemplate(name) => write!(f, "no defined template named {name:?}"),
            ExecError::NotPrintable => f.write_str("value is a mapping or sequence, not printable"),
            ExecError::NotIndexable => f.write_str("with/range target is not indexable data"),
            ExecError::EmptyCommand => f.write_str("empty pipeline command"),
            ExecError::SentinelArity(name) => write!(f, "{name} expects exactly one argument"),
            ExecError::Function(name, e) => write!(f, "function {name:?} failed: {e}"),
        }
    }
}

impl std::error::Error for ExecError {}

pub(crate) type NativeFn =
    dyn Fn(&Data, &[RuntimeValue]) -> Result<RuntimeValue, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync;

#[derive(Default)]
pub struct FuncMap(HashMap<String, Box<NativeFn>>);

impl FuncMap
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// `f` receives the caller's [`Data`] graph alongside its arguments
    /// so it can resolve a `RuntimeValue::Data(ValueId)` argument (an
    /// opaque arena key on its own) back into a real value, e.g. via
    /// `data.node(id)`.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Data, &[RuntimeValue]) -> Result<RuntimeValue, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.0.insert(name.into(), Box::new(f));
    }

    pub(crate) fn get(&self, name: &str) -> Option<&NativeFn>
    {
        self.0.get(name).map(|f| f.as_ref())
    }
}

/// Value flowing through pipeline evaluation. `Data` is the only variant
/// that refers back into the caller's graph -- and so the only variant
/// the data mutator's work (via [`Policy`]) ever applies to.
#[derive(Debug, Clone)]
pub enum RuntimeValue
{
    Data(ValueId),
    Literal(String),
    Computed(String),
    Bool(bool),
}

impl RuntimeValue
{
    fn is_truthy(&self, data: &Data) -> bool
    {
        match self
        {
            RuntimeValue::Data(id) => data.node(*id).is_truthy(),
            RuntimeValue::Literal(s) | RuntimeValue::Computed(s) => !s.is_empty(),
            RuntimeValue::Bool(b) => *b,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Span
{
    pub range:  Range<usize>,
    pub marker: SiteMarker,
}

pub(crate) struct Output
{
    pub text:  String,
    pub spans: Vec<Span>,
}

/// Runs `nodes` against `data` under `policy`.
///
/// For a non-[`Policy::Identity`] pass, the whole reachable graph is
/// mutated up front via [`mutator::mutate`] rather than transforming
/// each leaf string as it's printed: this is what lets a registered
/// [`NativeFn`] that resolves a `RuntimeValue::Data` argument back into
/// a value (spec section 6's collaborator contract) see the same
/// placeholder/mutated content a directly-printed field would. Dot
/// values and field lookups still walk the *original* `data` -- the
/// graph's shape never changes under mutation -- and are translated to
/// the mutated copy's ids only at the point a value is actually printed
/// or handed to a function.
pub(crate) fn execute(
    nodes: &[Node],
    templates: &HashMap<String, Vec<Node>>,
    data: &Data,
    dot: ValueId,
    policy: Policy,
    funcs: &FuncMap,
) -> Result<Output, ExecError>
{
    let mutated = match policy
    {
        Policy::Identity => None,
        Policy::Baseline => Some(mutator::mutate(data, &mutator::placeholder)),
        Policy::Mutated => Some(mutator::mutate(data, &mutator::double_runes)),
    };

    let active = mutated.as_ref().map_or(data, |(d, _)| d);
    let id_map = mutated.as_ref().map(|(_, m)| m);

    let mut ex = Executor {
        templates,
        data,
        active,
        id_map,
        policy,
        funcs,
        out: String::new(),
        spans: Vec::new(),
    };

    ex.exec_nodes(nodes, dot)?;

    Ok(Output {
        text:  ex.out,
        spans: ex.spans,
    })
}

struct Executor<'a>
{
    templates: &'a HashMap<String, Vec<Node>>,
    /// The caller's original graph. Field/range/with traversal and
    /// `StructuralData` resolution always read from here, since mutation
    /// never changes graph shape and `StructuralData` sites are never
    /// supposed to see a mutated value.
    data:      &'a Data,
    /// `data` itself under [`Policy::Identity`], or a full mutated copy
    /// otherwise; this is what a leaf actually renders from.
    active:    &'a Data,
    id_map:    Option<&'a SecondaryMap<ValueId, ValueId>>,
    policy:    Policy,
    funcs:     &'a FuncMap,
    out:       String,
    spans:     Vec<Span>,
}

impl<'a> Executor<'a>
{
    fn exec_nodes(&mut self, nodes: &[Node], dot: ValueId) -> Result<(), ExecError>
    {
        for node in nodes
        {
            self.exec_node(node, dot)?;
        }

        Ok(())
    }

    fn exec_node(&mut self, node: &Node, dot: ValueId) -> Result<(), ExecError>
    {
        match node
        {
            Node::Text(text) => self.out.push_str(text),
            Node::Action(pipeline) =>
            {
                let (val, marker) = self.eval_pipeline(pipeline, dot)?;
                self.render_value(val, marker)?;
            },
            Node::If {
                cond,
                body,
                else_body,
            } =>
            {
                let (val, _) = self.eval_pipeline(cond, dot)?;

                if val.is_truthy(self.data)
                {
                    self.exec_nodes(body, dot)?;
                }
                else if let Some(else_body) = else_body
                {
                    self.exec_nodes(else_body, dot)?;
                }
            },
            Node::With {
                pipeline,
                body,
                else_body,
            } =>
            {
                let (val, _) = self.eval_pipeline(pipeline, dot)?;

                if val.is_truthy(self.data)
                {
                    let inner_dot = match val
                    {
                        RuntimeValue::Data(id) => id,
                        _ => dot,
                    };

                    self.exec_nodes(body, inner_dot)?;
                }
                else if let Some(else_body) = else_body
                {
                    self.exec_nodes(else_body, dot)?;
                }
            },
            Node::Range {
                pipeline,
                body,
                else_body,
            } =>
            {
                let (val, _) = self.eval_pipeline(pipeline, dot)?;

                let RuntimeValue::Data(id) = val
                else
                {
                    return Err(ExecError::NotIndexable);
                };

                let items: Vec<ValueId> = match self.data.node(id)
                {
                    Value::Seq(items) => items.clone(),
                    Value::Map(entries) => entries.iter().map(|(_, v)| *v).collect(),
                    _ => return Err(ExecError::NotIndexable),
                };

                if items.is_empty()
                {
                    if let Some(else_body) = else_body
                    {
                        self.exec_nodes(else_body, dot)?;
                    }
                }
                else
                {
                    for item in items
                    {
                        self.exec_nodes(body, item)?;
                    }
                }
            },
            Node::Define { .. } =>
            {
                // Collected ahead of time by the engine; nothing to emit
                // where it textually appears.
            },
            Node::TemplateCall { name, pipeline } =>
            {
                let inner_dot = match pipeline
                {
                    Some(p) =>
                    {
                        let (val, _) = self.eval_pipeline(p, dot)?;

                        match val
                        {
                            RuntimeValue::Data(id) => id,
                            _ => dot,
                        }
                    },
                    None => dot,
                };

                let body = self
                    .templates
                    .get(name)
                    .ok_or_else(|| ExecError::UnknownTemplate(name.clone()))?;

                self.exec_nodes(body, inner_dot)?;
            },
        }

        Ok(())
    }

    fn eval_pipeline(
        &mut self,
        pipeline: &Pipeline,
        dot: ValueId,
    ) -> Result<(RuntimeValue, SiteMarker), ExecError>
    {
        let mut prev = None;
        let mut marker = SiteMarker::Plain;

        for cmd in &pipeline.commands
        {
            let (val, m) = self.eval_command(cmd, prev.take(), dot)?;
            prev = Some(val);
            marker = m;
        }

        Ok((prev.expect("pipeline always has at least one command"), marker))
    }

    fn eval_command(
        &mut self,
        cmd: &Command,
        prev: Option<RuntimeValue>,
        dot: ValueId,
    ) -> Result<(RuntimeValue, SiteMarker), ExecError>
    {
        match &cmd.func
        {
            None =>
            {
                let term = cmd.args.first().ok_or(ExecError::EmptyCommand)?;

                Ok((self.eval_term(term, dot)?, SiteMarker::Plain))
            },
            Some(name) =>
            {
                let mut args = cmd
                    .args
                    .iter()
                    .map(|t| self.eval_term(t, dot))
                    .collect::<Result<Vec<_>, _>>()?;

                if let Some(prev) = prev
                {
                    args.push(prev);
                }

                if let Some(marker) = marker_for(name)
                {
                    if args.len() != 1
                    {
                        return Err(ExecError::SentinelArity(name.clone()));
                    }

                    return Ok((args.into_iter().next().unwrap(), marker));
                }

                let f = self
                    .funcs
                    .get(name)
                    .ok_or_else(|| ExecError::UnknownFunction(name.clone()))?;

                // Translate any Data argument into the active (possibly
                // mutated) graph's id space so the function resolves the
                // same content a direct field access would print.
                let active_args: Vec<RuntimeValue> = args
                    .iter()
                    .map(|v| match v
                    {
                        RuntimeValue::Data(id) => RuntimeValue::Data(self.active_id(*id)),
                        other => other.clone(),
                    })
                    .collect();

                let result =
                    f(self.active, &active_args).map_err(|e| ExecError::Function(name.clone(), e))?;

                Ok((result, SiteMarker::Plain))
            },
        }
    }

    fn eval_term(&mut self, term: &Term, dot: ValueId) -> Result<RuntimeValue, ExecError>
    {
        match term
        {
            Term::Dot => Ok(RuntimeValue::Data(dot)),
            Term::Field(parts) =>
            {
                let mut cur = dot;

                for part in parts
                {
                    cur = self
                        .data
                        .field(cur, part)
                        .ok_or_else(|| ExecError::MissingField(part.clone()))?;
                }

                Ok(RuntimeValue::Data(cur))
            },
            Term::String(s) => Ok(RuntimeValue::Literal(s.clone())),
            Term::Int(i) => Ok(RuntimeValue::Computed(i.to_string())),
            Term::Float(f) => Ok(RuntimeValue::Computed(f.to_string())),
            Term::Bool(b) => Ok(RuntimeValue::Bool(*b)),
            Term::Pipeline(p) =>
            {
                let (val, _) = self.eval_pipeline(p, dot)?;

                Ok(val)
            },
        }
    }

    fn render_value(&mut self, val: RuntimeValue, marker: SiteMarker) -> Result<(), ExecError>
    {
        let start = self.out.len();

        let text = match (&val, marker)
        {
            (RuntimeValue::Data(id), SiteMarker::StructuralData) => self.render_data_raw(*id)?,
            (RuntimeValue::Data(id), _) => self.render_data_policy(*id)?,
            (RuntimeValue::Computed(s), SiteMarker::ApplyInjectionDetection) =>
            {
                self.policy.transform(s)
            },
            (RuntimeValue::Computed(s), _) => s.clone(),
            (RuntimeValue::Literal(s), _) => s.clone(),
            (RuntimeValue::Bool(b), _) => b.to_string(),
        };

        self.out.push_str(&text);
        self.spans.push(Span {
            range: start..self.out.len(),
            marker,
        });

        Ok(())
    }

    fn render_data_policy(&self, id: ValueId) -> Result<String, ExecError>
    {
        match self.active.node(self.active_id(id))
        {
            Value::Str(s) => Ok(s.clone()),
            other => scalar_text(other),
        }
    }

    fn render_data_raw(&self, id: ValueId) -> Result<String, ExecError>
    {
        match self.data.node(id)
        {
            Value::Str(s) => Ok(s.clone()),
            other => scalar_text(other),
        }
    }

    /// Maps a `ValueId` in the original graph to its counterpart in
    /// [`Self::active`]. The identity under [`Policy::Identity`], since
    /// `active` is `data` itself there and no map is built.
    fn active_id(&self, id: ValueId) -> ValueId
    {
        match self.id_map
        {
            Some(map) => map.get(id).copied().unwrap_or(id),
            None => id,
        }
    }
}

fn scalar_text(value: &Value) -> Result<String, ExecError>
{
    match value
    {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Seq(_) | Value::Map(_) => Err(ExecError::NotPrintable),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{
        data::value::DataBuilder,
        tmpl::{ast::Node, parse::parse},
    };

    fn run(src: &str, data: &Data, dot: ValueId, policy: Policy) -> String
    {
        let nodes = parse(src, "{{", "}}").expect("parses");
        let funcs = FuncMap::new();
        let templates = HashMap::new();

        execute(&nodes, &templates, data, dot, policy, &funcs)
            .expect("executes")
            .text
    }

    #[test]
    fn identity_renders_real_value()
    {
        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("world".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let out = run("hello {{ .Name }}", &data, data.root(), Policy::Identity);

        assert_eq!(out, "hello world");
    }

    #[test]
    fn baseline_placeholds_scalars()
    {
        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("world".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let out = run("hello {{ .Name }}", &data, data.root(), Policy::Baseline);

        assert_eq!(out, "hello PLACEHOLDER");
    }

    #[test]
    fn mutated_doubles_runes()
    {
        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("ab".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let out = run("{{ .Name }}", &data, data.root(), Policy::Mutated);

        assert_eq!(out, "aabb");
    }

    #[test]
    fn structural_data_is_never_mutated()
    {
        let mut b = DataBuilder::new();
        let tag = b.insert(Value::Str("release".into()));
        let root = b.insert(Value::Map(vec![("Tag".into(), tag)]));
        let data = b.finish(root);

        let out = run(
            "{{ StructuralData .Tag }}",
            &data,
            data.root(),
            Policy::Mutated,
        );

        assert_eq!(out, "release");
    }

    #[test]
    fn native_fn_receives_baseline_value_for_data_argument()
    {
        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("world".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let nodes = parse("{{ shout .Name }}", "{{", "}}").expect("parses");
        let mut funcs = FuncMap::new();
        funcs.insert("shout", |data: &Data, args: &[RuntimeValue]| {
            let RuntimeValue::Data(id) = &args[0]
            else
            {
                panic!("expected a data argument")
            };

            let Value::Str(s) = data.node(*id)
            else
            {
                panic!("expected a string")
            };

            Ok(RuntimeValue::Computed(s.to_uppercase()))
        });
        let templates = HashMap::new();

        let baseline = execute(&nodes, &templates, &data, data.root(), Policy::Baseline, &funcs)
            .expect("executes")
            .text;

        assert_eq!(baseline, "PLACEHOLDER");
    }

    #[test]
    fn range_over_sequence()
    {
        let mut b = DataBuilder::new();
        let a = b.insert(Value::Str("a".into()));
        let c = b.insert(Value::Str("c".into()));
        let seq = b.insert(Value::Seq(vec![a, c]));
        let data = b.finish(seq);

        let out = run("{{ range . }}{{ . }},{{ end }}", &data, data.root(), Policy::Identity);

        assert_eq!(out, "a,c,");
    }
}
