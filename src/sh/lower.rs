/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Lowers a `tree-sitter-bash` concrete syntax tree into [`crate::sh::ast`].
//!
//! Spec.md 4.3 requires the shell parser to "expose the full command/
//! word/expression node taxonomy ... with all operator and flag
//! fields". `tree-sitter-bash` is the grammar; this module is the
//! bridge between its CST node kinds and the judge's own tree shape. A
//! CST node kind this module does not recognize is lowered to an opaque
//! literal word built from its source text rather than panicking --
//! `crate::fault::guard` treats an unexpected shape as an injection
//! signal regardless, and a parser that can't describe part of its own
//! output is exactly the "type confusion" spec.md 7 asks us to assume
//! can happen.

use tree_sitter::{Node as CstNode, Parser, Tree};

use crate::sh::ast::{
    Assignment, AssignOp, AssignValue, CaseArm, Command, ListOp, ParamModifier,
    ProcessSubstDirection, Redirect, RedirectKind, SimpleCommand, TestExpr, TimeKind, Word,
    WordPart,
};

#[derive(Debug)]
pub(crate) struct LowerError(pub String);

impl std::fmt::Display for LowerError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "shell parse error: {}", self.0)
    }
}

impl std::error::Error for LowerError {}

pub(crate) fn parse_program(src: &str) -> Result<Vec<Command>, LowerError>
{
    let tree = parse_cst(src)?;
    let root = tree.root_node();

    if root.has_error()
    {
        return Err(LowerError(format!("syntax error in {:?}", root.to_sexp())));
    }

    let l = Lowerer { src };
    let mut out = Vec::new();
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor)
    {
        if child.kind() == "comment"
        {
            continue;
        }

        out.push(l.statement(child)?);
    }

    Ok(out)
}

fn parse_cst(src: &str) -> Result<Tree, LowerError>
{
    let mut parser = Parser::new();
    let language = tree_sitter::Language::from(tree_sitter_bash::LANGUAGE);

    parser
        .set_language(&language)
        .map_err(|e| LowerError(e.to_string()))?;

    parser
        .parse(src, None)
        .ok_or_else(|| LowerError("tree-sitter produced no tree".into()))
}

struct Lowerer<'a>
{
    src: &'a str,
}

impl<'a> Lowerer<'a>
{
    fn text(&self, node: CstNode) -> &'a str
    {
        node.utf8_text(self.src.as_bytes()).unwrap_or_default()
    }

    fn named(&self, node: CstNode) -> Vec<CstNode<'a>>
    {
        let mut cursor = node.walk();

        node.named_children(&mut cursor).collect()
    }

    fn statement(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        match node.kind()
        {
            "command" | "variable_assignments" => self.simple_command(node),
            "redirected_statement" => self.redirected_statement(node),
            "pipeline" => self.pipeline(node, None),
            "negated_command" =>
            {
                let inner = self
                    .named(node)
                    .into_iter()
                    .find(|n| n.kind() != "negated_command")
                    .ok_or_else(|| LowerError("empty negated command".into()))?;

                match self.statement(inner)?
                {
                    Command::Pipeline { stages, time, .. } => Ok(Command::Pipeline {
                        stages,
                        negated: true,
                        time,
                    }),
                    other => Ok(Command::Pipeline {
                        stages: vec![other],
                        negated: true,
                        time: None,
                    }),
                }
            },
            "list" => self.list(node),
            "if_statement" => self.if_statement(node),
            "while_statement" => self.while_statement(node, false),
            "for_statement" => self.for_statement(node),
            "c_style_for_statement" => self.c_style_for(node),
            "case_statement" => self.case_statement(node),
            "subshell" => Ok(Command::Subshell(self.statement_list(node)?)),
            "compound_statement" => Ok(Command::Group(self.statement_list(node)?)),
            "function_definition" => self.function_definition(node),
            "test_command" => self.test_command(node),
            "declaration_command" | "unset_command" => self.declaration(node),
            "arithmetic_command" => Ok(Command::Arithmetic(
                self.text(node).trim().to_string(),
            )),
            "coproc" => self.coproc(node),
            "do_group" | "program" => Ok(Command::Group(self.statement_list(node)?)),
            _ =>
            {
                // Unrecognized compound shape: fall back to an opaque
                // simple command so the judge still sees a node of a
                // stable, comparable kind rather than nothing at all.
                Ok(Command::Simple(SimpleCommand {
                    assignments: Vec::new(),
                    name: Some(self.word_from_text(self.text(node))),
                    args: Vec::new(),
                    redirects: Vec::new(),
                }))
            },
        }
    }

    fn statement_list(&self, node: CstNode<'a>) -> Result<Vec<Command>, LowerError>
    {
        self.named(node)
            .into_iter()
            .filter(|n| n.kind() != "comment")
            .map(|n| self.statement(n))
            .collect()
    }

    fn list(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let children = self.named(node);
        let left = children
            .first()
            .ok_or_else(|| LowerError("empty list".into()))?;
        let right = children
            .get(1)
            .ok_or_else(|| LowerError("list missing right operand".into()))?;

        let op = if self.operator_text(node, "&&") { ListOp::And }
        else if self.operator_text(node, "||") { ListOp::Or }
        else if self.operator_text(node, "&") { ListOp::Async }
        else { ListOp::Seq };

        Ok(Command::List {
            left:  Box::new(self.statement(*left)?),
            op,
            right: Box::new(self.statement(*right)?),
        })
    }

    fn operator_text(&self, node: CstNode<'a>, op: &str) -> bool
    {
        self.text(node).contains(op)
    }

    fn redirected_statement(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let mut base: Option<Command> = None;
        let mut redirects = Vec::new();

        for child in self.named(node)
        {
            match child.kind()
            {
                "file_redirect" | "heredoc_redirect" | "herestring_redirect" =>
                {
                    redirects.push(self.redirect(child)?);
                },
                _ => base = Some(self.statement(child)?),
            }
        }

        match base
        {
            Some(Command::Simple(mut cmd)) =>
            {
                cmd.redirects.extend(redirects);

                Ok(Command::Simple(cmd))
            },
            Some(other) => Ok(other),
            None => Err(LowerError("redirected statement with no command".into())),
        }
    }

    fn redirect(&self, node: CstNode<'a>) -> Result<Redirect, LowerError>
    {
        let text = self.text(node);
        let fd = text
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<u32>()
            .ok();

        let target = self
            .named(node)
            .into_iter()
            .last()
            .map(|n| self.word(n))
            .transpose()?
            .unwrap_or_else(|| self.word_from_text(""));

        let kind = if text.contains(">>") { RedirectKind::Append }
        else if text.contains("<<<") { RedirectKind::HereString }
        else if text.contains("<<-") { RedirectKind::Heredoc { strip_tabs: true, quoted: text.contains('\'') || text.contains('"') } }
        else if text.contains("<<") { RedirectKind::Heredoc { strip_tabs: false, quoted: text.contains('\'') || text.contains('"') } }
        else if text.contains(">&") { RedirectKind::DupOut }
        else if text.contains("<&") { RedirectKind::DupIn }
        else if text.contains(">|") { RedirectKind::Clobber }
        else if text.contains("<>") { RedirectKind::InOut }
        else if text.contains('<') { RedirectKind::In }
        else { RedirectKind::Out };

        let heredoc_body = if matches!(kind, RedirectKind::Heredoc { .. })
        {
            node.parent()
                .and_then(|p| p.child_by_field_name("body"))
                .map(|b| self.text(b).to_string())
        }
        else
        {
            None
        };

        Ok(Redirect {
            fd,
            kind,
            target,
            heredoc_body,
        })
    }

    fn pipeline(&self, node: CstNode<'a>, time: Option<TimeKind>) -> Result<Command, LowerError>
    {
        let stages = self
            .named(node)
            .into_iter()
            .filter(|n| n.kind() != "comment")
            .map(|n| self.statement(n))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Command::Pipeline {
            stages,
            negated: false,
            time,
        })
    }

    fn simple_command(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let mut assignments = Vec::new();
        let mut name = None;
        let mut args = Vec::new();
        let mut redirects = Vec::new();

        for child in self.named(node)
        {
            match child.kind()
            {
                "variable_assignment" => assignments.push(self.assignment(child)?),
                "command_name" =>
                {
                    let inner = self.named(child).into_iter().next().unwrap_or(child);

                    name = Some(self.word(inner)?);
                },
                "file_redirect" | "heredoc_redirect" | "herestring_redirect" =>
                {
                    redirects.push(self.redirect(child)?);
                },
                "comment" => {},
                _ => args.push(self.word(child)?),
            }
        }

        Ok(Command::Simple(SimpleCommand {
            assignments,
            name,
            args,
            redirects,
        }))
    }

    fn assignment(&self, node: CstNode<'a>) -> Result<Assignment, LowerError>
    {
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| LowerError("assignment missing name".into()))?;
        let value_node = node.child_by_field_name("value");
        let index_node = node.child_by_field_name("index");

        let op = if self.text(node).contains("+=") { AssignOp::Append } else { AssignOp::Set };

        let value = match value_node
        {
            Some(v) if v.kind() == "array" =>
            {
                let items = self
                    .named(v)
                    .into_iter()
                    .map(|n| self.word(n))
                    .collect::<Result<Vec<_>, _>>()?;

                Some(AssignValue::Array(items))
            },
            Some(v) => Some(AssignValue::Scalar(self.word(v)?)),
            None => None,
        };

        Ok(Assignment {
            name: self.text(name_node).to_string(),
            index: index_node.map(|n| self.word(n)).transpose()?,
            op,
            value,
        })
    }

    fn if_statement(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let children = self.named(node);
        let clause_start = children
            .iter()
            .position(|n| matches!(n.kind(), "elif_clause" | "else_clause"))
            .unwrap_or(children.len());

        let cond = children
            .first()
            .map(|n| self.statement(*n))
            .transpose()?
            .into_iter()
            .collect();
        let body = children[1..clause_start]
            .iter()
            .map(|n| self.statement(*n))
            .collect::<Result<Vec<_>, _>>()?;

        let mut branches = vec![(cond, body)];
        let mut else_body = None;

        for child in &children[clause_start..]
        {
            match child.kind()
            {
                "elif_clause" =>
                {
                    let inner = self.named(*child);
                    let cond = inner
                        .first()
                        .map(|n| self.statement(*n))
                        .transpose()?
                        .into_iter()
                        .collect();
                    let body = inner[1..]
                        .iter()
                        .map(|n| self.statement(*n))
                        .collect::<Result<Vec<_>, _>>()?;

                    branches.push((cond, body));
                },
                "else_clause" =>
                {
                    else_body = Some(self.statement_list(*child)?);
                },
                _ => {},
            }
        }

        Ok(Command::If {
            branches,
            else_body,
        })
    }

    fn while_statement(&self, node: CstNode<'a>, until: bool) -> Result<Command, LowerError>
    {
        let children = self.named(node);
        let cond = children
            .first()
            .map(|n| self.statement(*n))
            .transpose()?
            .into_iter()
            .collect();
        let body = children
            .get(1)
            .map(|n| self.statement_list(*n))
            .transpose()?
            .unwrap_or_default();

        let until = until || self.text(node).trim_start().starts_with("until");

        Ok(Command::While { cond, body, until })
    }

    fn for_statement(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let is_select = self.text(node).trim_start().starts_with("select");
        let var_node = node
            .child_by_field_name("variable")
            .ok_or_else(|| LowerError("for loop missing variable".into()))?;
        let var = self.text(var_node).to_string();

        let words = self
            .named(node)
            .into_iter()
            .filter(|n| n.kind() != "do_group" && n.kind() != "variable")
            .filter(|n| *n != var_node)
            .map(|n| self.word(n))
            .collect::<Result<Vec<_>, _>>()?;

        let body = self
            .named(node)
            .into_iter()
            .find(|n| n.kind() == "do_group")
            .map(|n| self.statement_list(n))
            .transpose()?
            .unwrap_or_default();

        if is_select
        {
            Ok(Command::Select { var, words, body })
        }
        else
        {
            Ok(Command::For { var, words, body })
        }
    }

    fn c_style_for(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let init = node.child_by_field_name("initializer").map(|n| self.text(n).to_string());
        let cond = node.child_by_field_name("condition").map(|n| self.text(n).to_string());
        let update = node.child_by_field_name("update").map(|n| self.text(n).to_string());
        let body = self
            .named(node)
            .into_iter()
            .find(|n| n.kind() == "do_group")
            .map(|n| self.statement_list(n))
            .transpose()?
            .unwrap_or_default();

        Ok(Command::CStyleFor {
            init,
            cond,
            update,
            body,
        })
    }

    fn case_statement(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let word_node = node
            .child_by_field_name("value")
            .ok_or_else(|| LowerError("case missing subject word".into()))?;
        let word = self.word(word_node)?;

        let mut arms = Vec::new();

        for item in self.named(node)
        {
            if item.kind() != "case_item"
            {
                continue;
            }

            let mut patterns = Vec::new();
            let mut body = Vec::new();

            for child in self.named(item)
            {
                match child.kind()
                {
                    "word" | "string" | "raw_string" | "extglob_pattern" | "concatenation" =>
                    {
                        patterns.push(self.word(child)?);
                    },
                    _ => body.push(self.statement(child)?),
                }
            }

            arms.push(CaseArm { patterns, body });
        }

        Ok(Command::Case { word, arms })
    }

    fn function_definition(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| LowerError("function missing name".into()))?;
        let body_node = node
            .child_by_field_name("body")
            .ok_or_else(|| LowerError("function missing body".into()))?;

        Ok(Command::FunctionDef {
            name: self.text(name_node).to_string(),
            body: Box::new(self.statement(body_node)?),
        })
    }

    fn coproc(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let children = self.named(node);
        let (name, body_node) = if children.len() >= 2 && children[0].kind() == "word"
        {
            (Some(self.text(children[0]).to_string()), children[1])
        }
        else
        {
            (None, *children.first().ok_or_else(|| LowerError("empty coproc".into()))?)
        };

        Ok(Command::Coproc {
            name,
            body: Box::new(self.statement(body_node)?),
        })
    }

    fn declaration(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let keyword = node
            .child(0)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let assignments = self
            .named(node)
            .into_iter()
            .filter(|n| n.kind() == "variable_assignment")
            .map(|n| self.assignment(n))
            .collect::<Result<Vec<_>, _>>()?;

        let bare_names = self
            .named(node)
            .into_iter()
            .filter(|n| n.kind() == "word")
            .map(|n| Assignment {
                name:  self.text(n).to_string(),
                index: None,
                op:    AssignOp::Set,
                value: None,
            });

        Ok(Command::Declaration {
            keyword,
            assignments: assignments.into_iter().chain(bare_names).collect(),
        })
    }

    fn test_command(&self, node: CstNode<'a>) -> Result<Command, LowerError>
    {
        let inner = self
            .named(node)
            .into_iter()
            .next()
            .ok_or_else(|| LowerError("empty test command".into()))?;

        Ok(Command::Test(self.test_expr(inner)?))
    }

    fn test_expr(&self, node: CstNode<'a>) -> Result<TestExpr, LowerError>
    {
        match node.kind()
        {
            "unary_expression" =>
            {
                let children = self.named(node);
                let op = self
                    .text(node)
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_string();
                let operand = children
                    .last()
                    .map(|n| self.word(*n))
                    .transpose()?
                    .unwrap_or_else(|| self.word_from_text(""));

                Ok(TestExpr::Unary { op, operand })
            },
            "binary_expression" =>
            {
                let lhs_node = node.child_by_field_name("left");
                let rhs_node = node.child_by_field_name("right");
                let op = node
                    .child_by_field_name("operator")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();

                Ok(TestExpr::Binary {
                    op,
                    lhs: lhs_node.map(|n| self.word(n)).transpose()?.unwrap_or_else(|| self.word_from_text("")),
                    rhs: rhs_node.map(|n| self.word(n)).transpose()?.unwrap_or_else(|| self.word_from_text("")),
                })
            },
            "negated_expression" | "unary_not" =>
            {
                let inner = self
                    .named(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| LowerError("empty negated test".into()))?;

                Ok(TestExpr::Not(Box::new(self.test_expr(inner)?)))
            },
            "parenthesized_expression" =>
            {
                let inner = self
                    .named(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| LowerError("empty grouped test".into()))?;

                Ok(TestExpr::Group(Box::new(self.test_expr(inner)?)))
            },
            "binary_and" | "and_expression" =>
            {
                let children = self.named(node);

                Ok(TestExpr::And(
                    Box::new(self.test_expr(children[0])?),
                    Box::new(self.test_expr(children[1])?),
                ))
            },
            "binary_or" | "or_expression" =>
            {
                let children = self.named(node);

                Ok(TestExpr::Or(
                    Box::new(self.test_expr(children[0])?),
                    Box::new(self.test_expr(children[1])?),
                ))
            },
            _ => Ok(TestExpr::Word(self.word(node)?)),
        }
    }

    fn word_from_text(&self, text: &str) -> Word
    {
        Word {
            parts:      vec![WordPart::Literal(text.to_string())],
            byte_range: 0..0,
        }
    }

    fn word(&self, node: CstNode<'a>) -> Result<Word, LowerError>
    {
        let parts = match node.kind()
        {
            "word" | "number" => vec![WordPart::Literal(self.text(node).to_string())],
            "raw_string" =>
            {
                let text = self.text(node);
                let inner = text.trim_matches('\'');

                vec![WordPart::SingleQuoted(inner.to_string())]
            },
            "string" | "ansi_c_string" | "translated_string" =>
            {
                let inner = self
                    .named(node)
                    .into_iter()
                    .map(|n| self.word_part(n))
                    .collect::<Result<Vec<_>, _>>()?;

                vec![WordPart::DoubleQuoted(inner)]
            },
            "concatenation" | "extglob_pattern" =>
            {
                let mut parts = Vec::new();

                for child in self.named(node)
                {
                    parts.push(self.word_part(child)?);
                }

                if parts.is_empty()
                {
                    parts.push(WordPart::Glob(self.text(node).to_string()));
                }

                parts
            },
            "simple_expansion" | "expansion" | "command_substitution" | "process_substitution"
            | "arithmetic_expansion" | "brace_expression" => vec![self.word_part(node)?],
            _ => vec![WordPart::Literal(self.text(node).to_string())],
        };

        Ok(Word {
            parts,
            byte_range: node.byte_range(),
        })
    }

    fn word_part(&self, node: CstNode<'a>) -> Result<WordPart, LowerError>
    {
        match node.kind()
        {
            "simple_expansion" =>
            {
                let name_node = self
                    .named(node)
                    .into_iter()
                    .next()
                    .unwrap_or(node);

                Ok(WordPart::VarExpansion {
                    name:     self.text(name_node).trim_start_matches('$').to_string(),
                    modifier: None,
                })
            },
            "expansion" => self.parameter_expansion(node),
            "command_substitution" =>
            {
                let backquoted = self.text(node).starts_with('`');
                let inner = self
                    .named(node)
                    .into_iter()
                    .map(|n| self.statement(n))
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap_or_default();

                Ok(WordPart::CommandSubst {
                    body: inner,
                    backquoted,
                })
            },
            "process_substitution" =>
            {
                let direction = if self.text(node).starts_with("<(")
                {
                    ProcessSubstDirection::In
                }
                else
                {
                    ProcessSubstDirection::Out
                };

                let body = self
                    .named(node)
                    .into_iter()
                    .map(|n| self.statement(n))
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap_or_default();

                Ok(WordPart::ProcessSubst { direction, body })
            },
            "arithmetic_expansion" => Ok(WordPart::ArithExpansion(self.text(node).to_string())),
            "brace_expression" =>
            {
                let items = self
                    .named(node)
                    .into_iter()
                    .map(|n| self.word(n))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(WordPart::BraceExpansion(items))
            },
            "extglob_pattern" => Ok(WordPart::Glob(self.text(node).to_string())),
            "raw_string" => Ok(WordPart::SingleQuoted(self.text(node).trim_matches('\'').to_string())),
            "string_content" | "word" | "number" => Ok(WordPart::Literal(self.text(node).to_string())),
            _ => Ok(WordPart::Literal(self.text(node).to_string())),
        }
    }

    fn parameter_expansion(&self, node: CstNode<'a>) -> Result<WordPart, LowerError>
    {
        let raw = self.text(node);
        let inner = raw.trim_start_matches("${").trim_end_matches('}');
        let name_node = node.child_by_field_name("name");
        let name = name_node
            .map(|n| self.text(n).to_string())
            .unwrap_or_else(|| {
                inner
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect()
            });

        let modifier = if inner.starts_with('#') && name_node.is_none()
        {
            Some(ParamModifier::Length)
        }
        else if inner.starts_with("!") && inner.ends_with('*')
        {
            Some(ParamModifier::Names)
        }
        else if let Some(op) = node.child_by_field_name("operator")
        {
            let op_text = self.text(op);
            let rhs = node
                .child_by_field_name("alternative")
                .or_else(|| node.child_by_field_name("replacement"))
                .map(|n| self.word(n))
                .transpose()?
                .map(Box::new);

            match op_text
            {
                ":-" => Some(ParamModifier::DefaultIfUnset { word: rhs.unwrap_or_default_word(self), colon: true }),
                "-" => Some(ParamModifier::DefaultIfUnset { word: rhs.unwrap_or_default_word(self), colon: false }),
                ":=" => Some(ParamModifier::AssignIfUnset { word: rhs.unwrap_or_default_word(self), colon: true }),
                "=" => Some(ParamModifier::AssignIfUnset { word: rhs.unwrap_or_default_word(self), colon: false }),
                ":?" => Some(ParamModifier::ErrorIfUnset { word: rhs.unwrap_or_default_word(self), colon: true }),
                "?" => Some(ParamModifier::ErrorIfUnset { word: rhs.unwrap_or_default_word(self), colon: false }),
                ":+" => Some(ParamModifier::AlternateIfSet { word: rhs.unwrap_or_default_word(self), colon: true }),
                "+" => Some(ParamModifier::AlternateIfSet { word: rhs.unwrap_or_default_word(self), colon: false }),
                "%%" => Some(ParamModifier::RemoveLargestSuffix(rhs.unwrap_or_default_word(self))),
                "%" => Some(ParamModifier::RemoveSmallestSuffix(rhs.unwrap_or_default_word(self))),
                "##" => Some(ParamModifier::RemoveLargestPrefix(rhs.unwrap_or_default_word(self))),
                "#" => Some(ParamModifier::RemoveSmallestPrefix(rhs.unwrap_or_default_word(self))),
                _ => None,
            }
        }
        else
        {
            None
        };

        Ok(WordPart::VarExpansion { name, modifier })
    }
}

/// Helper for the `Option<Box<Word>>` -> `Box<Word>` default used by
/// parameter-expansion lowering above, where a modifier form with no
/// explicit right-hand side defaults to the empty word.
trait OrDefaultWord
{
    fn unwrap_or_default_word(self, l: &Lowerer<'_>) -> Box<Word>;
}

impl OrDefaultWord for Option<Box<Word>>
{
    fn unwrap_or_default_word(self, l: &Lowerer<'_>) -> Box<Word>
    {
        self.unwrap_or_else(|| Box::new(l.word_from_text("")))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_simple_pipeline()
    {
        let cmds = parse_program("echo hi | grep h").expect("parses");

        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], Command::Pipeline { .. }));
    }

    #[test]
    fn parses_if_statement()
    {
        let cmds = parse_program("if true; then echo a; else echo b; fi").expect("parses");

        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], Command::If { .. }));
    }

    #[test]
    fn rejects_syntax_error()
    {
        let err = parse_program("if true; then").unwrap_err();

        assert!(err.0.contains("syntax error"));
    }
}
