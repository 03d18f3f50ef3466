/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The unsafe template engine this crate hosts internally, spec section
//! 6's collaborator contract: "a parse tree walkable leaf-by-leaf, a
//! function-table installation hook, and an execution hook that honors
//! the function table."
//!
//! This type is deliberately **not** exported from the crate root.
//! Calling [`Engine::execute_raw`] directly bypasses the structural
//! equivalence judge entirely; the only callers are the per-format
//! orchestrator (`crate::orchestrator`) and the per-format facades
//! (`crate::yaml::template`, `crate::sh::template`), which apply it
//! three times under three policies and never hand the honest output to
//! a caller until the judge has approved it.

use std::{collections::HashMap, fs, io, path::Path};

use crate::{
    data::value::{Data, ValueId},
    tmpl::{
        ast::Node,
        exec::{execute, ExecError, FuncMap, Output},
        parse::{parse, ParseError},
        policy::Policy,
    },
};

#[derive(Debug)]
pub enum EngineError
{
    Parse(ParseError),
    Io(io::Error),
    Glob(glob::PatternError),
}

impl std::fmt::Display for EngineError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            EngineError::Parse(e) => write!(f, "{e}"),
            EngineError::Io(e) => write!(f, "{e}"),
            EngineError::Glob(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ParseError> for EngineError
{
    fn from(e: ParseError) -> Self
    {
        EngineError::Parse(e)
    }
}

impl From<io::Error> for EngineError
{
    fn from(e: io::Error) -> Self
    {
        EngineError::Io(e)
    }
}

impl From<glob::PatternError> for EngineError
{
    fn from(e: glob::PatternError) -> Self
    {
        EngineError::Glob(e)
    }
}

/// A named template, plus every associated template defined (via
/// `{{define}}`, `AddParseTree`, `ParseFiles`, or `ParseGlob`) alongside
/// it. Mirrors `text/template`'s "a Template is a set of templates"
/// model: every member of the set shares one function table and one
/// delimiter pair.
#[derive(Clone)]
pub struct Engine
{
    name:       String,
    left:       String,
    right:      String,
    funcs:      std::sync::Arc<FuncMap>,
    bodies:     HashMap<String, Vec<Node>>,
}

impl Engine
{
    pub fn new(name: impl Into<String>) -> Self
    {
        Self {
            name:   name.into(),
            left:   "{{".to_string(),
            right:  "}}".to_string(),
            funcs:  std::sync::Arc::new(FuncMap::new()),
            bodies: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn delims(&mut self, left: impl Into<String>, right: impl Into<String>) -> &mut Self
    {
        self.left = left.into();
        self.right = right.into();

        self
    }

    pub fn funcs(&mut self, funcs: FuncMap) -> &mut Self
    {
        self.funcs = std::sync::Arc::new(funcs);

        self
    }

    /// Accepts (and ignores) `text/template`-style option strings such
    /// as `"missingkey=error"`. Kept for facade compatibility; this
    /// engine already treats a missing field as
    /// [`crate::tmpl::exec::ExecError::MissingField`] unconditionally.
    pub fn option(&mut self, _opts: &[&str]) -> &mut Self
    {
        self
    }

    /// Parses `src` as this engine's named template body, collecting any
    /// `{{define "..."}}` blocks it contains into the set.
    pub fn parse(&mut self, src: &str) -> Result<&mut Self, EngineError>
    {
        let name = self.name.clone();

        self.parse_named(&name, src)
    }

    /// Parses `src` and registers it under `name`, collecting any
    /// `{{define "..."}}` blocks it contains into the set alongside it.
    pub fn parse_named(&mut self, name: &str, src: &str) -> Result<&mut Self, EngineError>
    {
        let nodes = parse(src, &self.left, &self.right)?;
        let main = self.collect_defines(nodes);

        self.bodies.insert(name.to_string(), main);

        Ok(self)
    }

    pub fn parse_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<&mut Self, EngineError>
    {
        for path in paths
        {
            let src = fs::read_to_string(path)?;
            let file_name = path
                .as_ref()
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(&self.name)
                .to_string();

            self.parse_named(&file_name, &src)?;
        }

        Ok(self)
    }

    pub fn parse_glob(&mut self, pattern: &str) -> Result<&mut Self, EngineError>
    {
        let paths = glob::glob(pattern)?
            .filter_map(Result::ok)
            .collect::<Vec<_>>();

        self.parse_files(&paths)
    }

    /// Registers an already-parsed tree under `name` directly, per the
    /// facade's `AddParseTree`.
    pub fn add_parse_tree(&mut self, name: impl Into<String>, nodes: Vec<Node>) -> &mut Self
    {
        self.bodies.insert(name.into(), nodes);

        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Vec<Node>>
    {
        self.bodies.get(name)
    }

    pub fn templates(&self) -> Vec<&str>
    {
        self.bodies.keys().map(String::as_str).collect()
    }

    pub fn defined_templates(&self) -> String
    {
        let mut names: Vec<&str> = self.templates();
        names.sort_unstable();

        names
            .into_iter()
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn funcs_table(&self) -> &FuncMap
    {
        &self.funcs
    }

    pub(crate) fn bodies(&self) -> &HashMap<String, Vec<Node>>
    {
        &self.bodies
    }

    /// Runs `name` (or, if `None`, this engine's own name) against
    /// `data` under `policy`, with **no** injection detection applied.
    /// Only the orchestrator and the per-format facades may call this.
    pub(crate) fn execute_raw(
        &self,
        name: Option<&str>,
        data: &Data,
        dot: ValueId,
        policy: Policy,
    ) -> Result<Output, ExecError>
    {
        let name = name.unwrap_or(&self.name);
        let body = self
            .bodies
            .get(name)
            .ok_or_else(|| ExecError::UnknownTemplate(name.to_string()))?;

        execute(body, &self.bodies, data, dot, policy, &self.funcs)
    }

    /// Splits `{{define}}` blocks out of a freshly parsed node list,
    /// returning what remains as the template's own body (matching
    /// `text/template`: a `define` block's own text contributes nothing
    /// at its lexical position).
    fn collect_defines(&mut self, nodes: Vec<Node>) -> Vec<Node>
    {
        let mut main = Vec::with_capacity(nodes.len());

        for node in nodes
        {
            if let Node::Define { name, body } = node
            {
                self.bodies.insert(name, body);
            }
            else
            {
                main.push(node);
            }
        }

        main
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::data::value::{DataBuilder, Value};

    #[test]
    fn parse_and_execute_raw_identity()
    {
        let mut engine = Engine::new("t");
        engine.parse("hi {{ .Name }}").unwrap();

        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("Ada".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let out = engine
            .execute_raw(None, &data, data.root(), Policy::Identity)
            .unwrap();

        assert_eq!(out.text, "hi Ada");
    }

    #[test]
    fn define_block_registers_under_its_own_name()
    {
        let mut engine = Engine::new("t");
        engine
            .parse("{{ define \"greet\" }}hi {{ .Name }}{{ end }}{{ template \"greet\" . }}")
            .unwrap();

        assert!(engine.lookup("greet").is_some());

        let mut b = DataBuilder::new();
        let name = b.insert(Value::Str("Grace".into()));
        let root = b.insert(Value::Map(vec![("Name".into(), name)]));
        let data = b.finish(root);

        let out = engine
            .execute_raw(None, &data, data.root(), Policy::Identity)
            .unwrap();

        assert_eq!(out.text, "hi Grace");
    }
}
