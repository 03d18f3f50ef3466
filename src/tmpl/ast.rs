/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Parse tree for the minimal text/template-alike engine this crate
//! hosts, spec section 6's "collaborator contract": a parse tree
//! walkable leaf-by-leaf, with data-access leaves distinguishable from
//! literals so the marked expansion driver (`crate::tmpl::policy`) can
//! wrap each one in a per-site rendering policy.

#[derive(Debug, Clone)]
pub enum Node
{
    Text(String),
    Action(Pipeline),
    If
    {
        cond:      Pipeline,
        body:      Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
    Range
    {
        pipeline:  Pipeline,
        body:      Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
    With
    {
        pipeline:  Pipeline,
        body:      Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
    Define
    {
        name: String,
        body: Vec<Node>,
    },
    TemplateCall
    {
        name:     String,
        pipeline: Option<Pipeline>,
    },
}

/// A pipeline is one or more commands joined by `|`; the result of
/// command `N` becomes the final argument of command `N + 1`.
#[derive(Debug, Clone)]
pub struct Pipeline
{
    pub commands: Vec<Command>,
}

/// A single pipeline stage: either a bare value (dot, field chain, or
/// literal) or a function call applied to arguments.
#[derive(Debug, Clone)]
pub struct Command
{
    pub func: Option<String>,
    pub args: Vec<Term>,
}

/// A leaf the executor resolves against either the data graph (`Dot`,
/// `Field`) or nothing at all (literals). This is the granularity at
/// which [`crate::tmpl::policy`] assigns a rendering policy.
#[derive(Debug, Clone)]
pub enum Term
{
    Dot,
    Field(Vec<String>),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Pipeline(Box<Pipeline>),
}

impl Pipeline
{
    pub fn leaves(&self) -> Vec<&Term>
    {
        let mut out = Vec::new();

        for cmd in &self.commands
        {
            for arg in &cmd.args
            {
                match arg
                {
                    Term::Pipeline(p) => out.extend(p.leaves()),
                    other => out.push(other),
                }
            }
        }

        out
    }
}
