/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The shell-template facade, spec section 6, routed through the
//! orchestrator's 3-way `template` variant (spec.md 4.3).

use std::{io::Write, path::Path};

use crate::{
    data::value::Data,
    orchestrator::{self, Format, Verdict},
    sh::{
        ast::Command,
        error::ShError,
        judge,
        lower::parse_program,
    },
    tmpl::{
        ast::Node,
        engine::{Engine, EngineError},
        exec::{FuncMap, Output},
    },
};

struct ShFormat;

impl Format for ShFormat
{
    /// Keeps the honest rendering's own spans alongside its parse tree:
    /// the judge's `AllowFlags` lookup resolves call sites against byte
    /// offsets in that specific rendering, which differ pass to pass.
    type Tree = (Vec<Command>, Vec<crate::tmpl::exec::Span>);
    type Error = ShError;

    const THREE_WAY: bool = true;

    fn parse(output: &Output) -> Result<Self::Tree, String>
    {
        parse_program(&output.text)
            .map(|cmds| (cmds, output.spans.clone()))
            .map_err(|e| e.to_string())
    }

    fn judge(
        baseline: &Self::Tree,
        requested: &Self::Tree,
        mutated: Option<&Self::Tree>,
    ) -> Verdict
    {
        let (mutated_tree, _) = mutated.expect("ShFormat::THREE_WAY is true");

        match judge::judge(&baseline.0, &requested.0, mutated_tree, &requested.1)
        {
            judge::Verdict::Equivalent => Verdict::Equivalent,
            judge::Verdict::Injection => Verdict::Injection,
        }
    }

    fn invalid_template(detail: String) -> Self::Error
    {
        ShError::InvalidTemplate(detail)
    }

    fn injection(detail: String) -> Self::Error
    {
        ShError::Injection(detail)
    }
}

/// Injection-safe counterpart of `text/template.Template`, specialized
/// to POSIX/Bash shell command output.
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

    pub fn execute<W: Write>(&self, mut w: W, data: &Data) -> Result<(), ShError>
    {
        let text = orchestrator::execute::<ShFormat>(&self.engine, None, data)?;

        w.write_all(text.as_bytes()).map_err(ShError::from)
    }

    pub fn execute_template<W: Write>(
        &self,
        mut w: W,
        name: &str,
        data: &Data,
    ) -> Result<(), ShError>
    {
        let text = orchestrator::execute::<ShFormat>(&self.engine, Some(name), data)?;

        w.write_all(text.as_bytes()).map_err(ShError::from)
    }
}

pub fn must(result: Result<&mut Template, EngineError>) -> &mut Template
{
    match result
    {
        Ok(t) => t,
        Err(e) => panic!("guardtext::sh::template: {e}"),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::data::value::{DataBuilder, Value};

    fn simple_data(value: &str) -> Data
    {
        let mut b = DataBuilder::new();
        let v = b.insert(Value::Str(value.to_string()));
        let root = b.insert(Value::Map(vec![("Arg".into(), v)]));

        b.finish(root)
    }

    #[test]
    fn honest_argument_round_trips()
    {
        let mut t = Template::new("t");
        t.parse("echo {{ .Arg }}").unwrap();

        let data = simple_data("hello");
        let mut out = Vec::new();
        t.execute(&mut out, &data).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "echo hello");
    }

    #[test]
    fn injected_pipeline_is_rejected()
    {
        let mut t = Template::new("t");
        t.parse("echo {{ .Arg }}").unwrap();

        let data = simple_data("hi; rm -rf /");
        let mut out = Vec::new();
        let err = t.execute(&mut out, &data).unwrap_err();

        assert!(matches!(err, ShError::Injection(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn leading_dash_data_is_rejected_without_allow_flags()
    {
        let mut t = Template::new("t");
        t.parse("rm {{ .Arg }}").unwrap();

        let data = simple_data("-rf");
        let mut out = Vec::new();
        let err = t.execute(&mut out, &data).unwrap_err();

        assert!(matches!(err, ShError::Injection(_)));
    }

    #[test]
    fn allow_flags_permits_leading_dash_data()
    {
        let mut t = Template::new("t");
        t.parse("rm {{ AllowFlags .Arg }}").unwrap();

        let data = simple_data("-rf");
        let mut out = Vec::new();
        t.execute(&mut out, &data).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "rm -rf");
    }
}
