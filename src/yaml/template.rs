/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The YAML template facade, spec section 6: the `text/template`
//! construction surface preserved for drop-in replacement, with
//! `Execute`/`ExecuteTemplate` routed through the orchestrator instead
//! of the hosted engine directly.

use std::{io::Write, path::Path};

use crate::{
    data::value::Data,
    orchestrator::{self, Format, Verdict},
    tmpl::{
        ast::Node,
        engine::{Engine, EngineError},
        exec::FuncMap,
    },
    yaml::{
        error::YamlError,
        judge,
        tree::{self, YamlDocument},
    },
};

struct YamlFormat;

impl Format for YamlFormat
{
    type Tree = Vec<YamlDocument>;
    type Error = YamlError;

    const THREE_WAY: bool = true;

    fn parse(output: &crate::tmpl::exec::Output) -> Result<Self::Tree, String>
    {
        tree::parse_documents(&output.text).map_err(|e| e.to_string())
    }

    fn judge(
        baseline: &Self::Tree,
        requested: &Self::Tree,
        mutated: Option<&Self::Tree>,
    ) -> Verdict
    {
        let mutated = mutated.expect("YamlFormat::THREE_WAY is true");

        match judge::judge(baseline, requested, mutated)
        {
            judge::Verdict::Equivalent => Verdict::Equivalent,
            judge::Verdict::Injection => Verdict::Injection,
            judge::Verdict::InvalidTemplate => Verdict::InvalidTemplate,
        }
    }

    fn invalid_template(detail: String) -> Self::Error
    {
        YamlError::InvalidTemplate(detail)
    }

    fn injection(detail: String) -> Self::Error
    {
        YamlError::Injection(detail)
    }
}

/// Injection-safe counterpart of `text/template.Template`, specialized
/// to YAML output.
#[derive(Clone)]
pub struct Template
{
    engine: Engine,
}

impl Template
{
    pub fn new(name: impl Into<String>) -> Self
    {
        Self {
            engine: Engine::new(name),
        }
    }

    pub fn name(&self) -> &str
    {
        self.engine.name()
    }

    pub fn delims(&mut self, left: impl Into<String>, right: impl Into<String>) -> &mut Self
    {
        self.engine.delims(left, right);

        self
    }

    pub fn option(&mut self, opts: &[&str]) -> &mut Self
    {
        self.engine.option(opts);

        self
    }

    pub fn funcs(&mut self, funcs: FuncMap) -> &mut Self
    {
        self.engine.funcs(funcs);

        self
    }

    pub fn parse(&mut self, src: &str) -> Result<&mut Self, EngineError>
    {
        self.engine.parse(src)?;

        Ok(self)
    }

    pub fn parse_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<&mut Self, EngineError>
    {
        self.engine.parse_files(paths)?;

        Ok(self)
    }

    pub fn parse_glob(&mut self, pattern: &str) -> Result<&mut Self, EngineError>
    {
        self.engine.parse_glob(pattern)?;

        Ok(self)
    }

    /// Rust has no embedded-filesystem standard; a caller passes the
    /// `(name, source)` pairs it already loaded from whatever virtual
    /// filesystem it's using (`include_dir!`, a zip, an embedded asset
    /// map) instead of a `fs::FS` handle.
    pub fn parse_fs<I>(&mut self, files: I) -> Result<&mut Self, EngineError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, src) in files
        {
            self.engine.parse_named(&name, &src)?;
        }

        Ok(self)
    }

    pub fn add_parse_tree(&mut self, name: impl Into<String>, nodes: Vec<Node>) -> &mut Self
    {
        self.engine.add_parse_tree(name, nodes);

        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Template>
    {
        self.engine.lookup(name).map(|_| self)
    }

    pub fn templates(&self) -> Vec<&str>
    {
        self.engine.templates()
    }

    pub fn defined_templates(&self) -> String
    {
        self.engine.defined_templates()
    }

    pub fn execute<W: Write>(&self, mut w: W, data: &Data) -> Result<(), YamlError>
    {
        let text = orchestrator::execute::<YamlFormat>(&self.engine, None, data)?;

        w.write_all(text.as_bytes()).map_err(YamlError::from)
    }

    pub fn execute_template<W: Write>(
        &self,
        mut w: W,
        name: &str,
        data: &Data,
    ) -> Result<(), YamlError>
    {
        let text = orchestrator::execute::<YamlFormat>(&self.engine, Some(name), data)?;

        w.write_all(text.as_bytes()).map_err(YamlError::from)
    }
}

/// Panics if `result` is an error; mirrors `text/template.Must` for the
/// common `Must(New("x").Parse(src))` construction idiom.
pub fn must(result: Result<&mut Template, EngineError>) -> &mut Template
{
    match result
    {
        Ok(t) => t,
        Err(e) => panic!("guardtext::yaml::template: {e}"),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::data::value::{DataBuilder, Value};

    fn simple_data(addressee: &str) -> Data
    {
        let mut b = DataBuilder::new();
        let v = b.insert(Value::Str(addressee.to_string()));
        let root = b.insert(Value::Map(vec![("addressee".into(), v)]));

        b.finish(root)
    }

    #[test]
    fn honest_value_round_trips()
    {
        let mut t = Template::new("t");
        t.parse("{ hello: {{ .addressee }} }").unwrap();

        let data = simple_data("world");
        let mut out = Vec::new();
        t.execute(&mut out, &data).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "{ hello: world }");
    }

    #[test]
    fn structural_injection_is_rejected()
    {
        let mut t = Template::new("t");
        t.parse("{ hello: {{ .addressee }} }").unwrap();

        let data = simple_data("world, oops: true");
        let mut out = Vec::new();
        let err = t.execute(&mut out, &data).unwrap_err();

        assert!(matches!(err, YamlError::Injection(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn new_alias_is_rejected()
    {
        let mut t = Template::new("t");
        t.parse("{ secret: &a 't', disclosed: {{ .c }} }").unwrap();

        let data = simple_data_named("c", "*a");
        let mut out = Vec::new();
        let err = t.execute(&mut out, &data).unwrap_err();

        assert!(matches!(err, YamlError::Injection(_)));
    }

    fn simple_data_named(field: &str, value: &str) -> Data
    {
        let mut b = DataBuilder::new();
        let v = b.insert(Value::Str(value.to_string()));
        let root = b.insert(Value::Map(vec![(field.into(), v)]));

        b.finish(root)
    }
}
