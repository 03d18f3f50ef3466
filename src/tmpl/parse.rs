/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Recursive-descent parser turning source text plus a delimiter pair
//! into a [`Node`] tree.
//!
//! Supports the action vocabulary `text/template` callers actually rely
//! on in generated configuration: `if`/`else`/`end`, `range`/`else`/
//! `end`, `with`/`else`/`end`, `define`/`end`, `template`, field chains,
//! and piped function calls. Declared loop variables (`range $i, $v :=`)
//! are out of scope -- nothing in this crate's data model needs them,
//! and the collaborator contract (spec.md 6) only requires a walkable
//! tree and a function-table hook, not full `text/template` parity.

use std::fmt;

use crate::tmpl::ast::{Command, Node, Pipeline, Term};

#[derive(Debug)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "template parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

pub(crate) fn parse(src: &str, left: &str, right: &str) -> Result<Vec<Node>, ParseError>
{
    let mut p = Parser {
        src,
        pos: 0,
        left,
        right,
    };

    let (nodes, terminator) = p.parse_until(&[])?;

    if terminator.is_some()
    {
        return Err(ParseError("unexpected end/else outside a block".into()));
    }

    Ok(nodes)
}

struct Parser<'a>
{
    src:   &'a str,
    pos:   usize,
    left:  &'a str,
    right: &'a str,
}

/// What stopped a `parse_until` call: a bare `end`, or an `else` (with
/// an optional re-test pipeline for `else if`).
enum Terminator
{
    End,
    Else(Option<Pipeline>),
}

impl<'a> Parser<'a>
{
    fn rest(&self) -> &'a str
    {
        &self.src[self.pos..]
    }

    fn parse_until(
        &mut self,
        stop_keywords: &[&str],
    ) -> Result<(Vec<Node>, Option<Terminator>), ParseError>
    {
        let _ = stop_keywords;
        let mut nodes = Vec::new();

        loop
        {
            match self.rest().find(self.left)
            {
                None =>
                {
                    if !self.rest().is_empty()
                    {
                        nodes.push(Node::Text(self.rest().to_string()));
                    }

                    self.pos = self.src.len();

                    return Ok((nodes, None));
                },
                Some(offset) =>
                {
                    if offset > 0
                    {
                        nodes.push(Node::Text(self.rest()[..offset].to_string()));
                    }

                    self.pos += offset;

                    let action_end = self
                        .rest()
                        .find(self.right)
                        .ok_or_else(|| ParseError("unterminated action".into()))?;

                    let raw = &self.rest()[self.left.len()..action_end];
                    self.pos += action_end + self.right.len();

                    let raw = raw.trim_start_matches('-').trim_end_matches('-').trim();

                    if raw.starts_with('/')
                    {
                        // comment, e.g. {{/* ... */}}; nothing to record.
                        continue;
                    }

                    let mut words = raw.splitn(2, char::is_whitespace);
                    let keyword = words.next().unwrap_or("");

                    match keyword
                    {
                        "if" =>
                        {
                            let cond = parse_pipeline(words.next().unwrap_or("").trim())?;
                            let (body, term) = self.parse_until(&["else", "end"])?;
                            let else_body = self.finish_if_chain(term)?;

                            nodes.push(Node::If {
                                cond,
                                body,
                                else_body,
                            });
                        },
                        "range" =>
                        {
                            let pipeline = parse_pipeline(words.next().unwrap_or(".").trim())?;
                            let (body, term) = self.parse_until(&["else", "end"])?;
                            let else_body = match term
                            {
                                Some(Terminator::End) | None => None,
                                Some(Terminator::Else(_)) =>
                                {
                                    let (body, term) = self.parse_until(&["end"])?;
                                    expect_end(term)?;

                                    Some(body)
                                },
                            };

                            nodes.push(Node::Range {
                                pipeline,
                                body,
                                else_body,
                            });
                        },
                        "with" =>
                        {
                            let pipeline = parse_pipeline(words.next().unwrap_or(".").trim())?;
                            let (body, term) = self.parse_until(&["else", "end"])?;
                            let else_body = match term
                            {
                                Some(Terminator::End) | None => None,
                                Some(Terminator::Else(_)) =>
                                {
                                    let (body, term) = self.parse_until(&["end"])?;
                                    expect_end(term)?;

                                    Some(body)
                                },
                            };

                            nodes.push(Node::With {
                                pipeline,
                                body,
                                else_body,
                            });
                        },
                        "define" =>
                        {
                            let name = parse_quoted(words.next().unwrap_or("").trim())?;
                            let (body, term) = self.parse_until(&["end"])?;
                            expect_end(term)?;

                            nodes.push(Node::Define { name, body });
                        },
                        "template" =>
                        {
                            let rest = words.next().unwrap_or("").trim();
                            let mut it = rest.splitn(2, char::is_whitespace);
                            let name = parse_quoted(it.next().unwrap_or(""))?;
                            let pipeline = match it.next()
                            {
                                Some(p) if !p.trim().is_empty() => Some(parse_pipeline(p.trim())?),
                                _ => None,
                            };

                            nodes.push(Node::TemplateCall { name, pipeline });
                        },
                        "end" => return Ok((nodes, Some(Terminator::End))),
                        "else" =>
                        {
                            let rest = words.next().unwrap_or("").trim();

                            if let Some(cond) = rest.strip_prefix("if ")
                            {
                                return Ok((
                                    nodes,
                                    Some(Terminator::Else(Some(parse_pipeline(cond.trim())?))),
                                ));
                            }

                            return Ok((nodes, Some(Terminator::Else(None))));
                        },
                        _ => nodes.push(Node::Action(parse_pipeline(raw)?)),
                    }
                },
            }
        }
    }

    /// After an `if` body hits `else`/`end`, folds the `else if` chain
    /// (if any) into a nested [`Node::If`], matching `text/template`'s
    /// own desugaring.
    fn finish_if_chain(
        &mut self,
        term: Option<Terminator>,
    ) -> Result<Option<Vec<Node>>, ParseError>
    {
        match term
        {
            None | Some(Terminator::End) => Ok(None),
            Some(Terminator::Else(None)) =>
            {
                let (body, term) = self.parse_until(&["end"])?;
                expect_end(term)?;

                Ok(Some(body))
            },
            Some(Terminator::Else(Some(cond))) =>
            {
                let (body, term) = self.parse_until(&["else", "end"])?;
                let else_body = self.finish_if_chain(term)?;

                Ok(Some(vec![Node::If {
                    cond,
                    body,
                    else_body,
                }]))
            },
        }
    }
}

fn expect_end(term: Option<Terminator>) -> Result<(), ParseError>
{
    match term
    {
        Some(Terminator::End) => Ok(()),
        Some(Terminator::Else(_)) => Err(ParseError("unexpected else".into())),
        None => Err(ParseError("missing end".into())),
    }
}

fn parse_quoted(s: &str) -> Result<String, ParseError>
{
    let s = s.trim();

    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
    {
        Ok(s[1..s.len() - 1].to_string())
    }
    else
    {
        Err(ParseError(format!("expected a quoted name, got {s:?}")))
    }
}

fn parse_pipeline(s: &str) -> Result<Pipeline, ParseError>
{
    let mut commands = Vec::new();

    for part in split_top_level(s, '|')
    {
        commands.push(parse_command(part.trim())?);
    }

    if commands.is_empty()
    {
        return Err(ParseError("empty pipeline".into()));
    }

    Ok(Pipeline { commands })
}

fn parse_command(s: &str) -> Result<Command, ParseError>
{
    let tokens = tokenize(s)?;

    if tokens.is_empty()
    {
        return Err(ParseError("empty command".into()));
    }

    let mut args = Vec::new();
    let mut func = None;

    for (i, tok) in tokens.iter().enumerate()
    {
        let term = term_from_token(tok)?;

        if i == 0
        {
            if let Token::Ident(name) = tok
            {
                func = Some(name.clone());
                continue;
            }
        }

        args.push(term);
    }

    Ok(Command { func, args })
}

#[derive(Debug, Clone)]
enum Token
{
    Dot,
    Field(Vec<String>),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(String),
    Paren(String),
}

fn term_from_token(tok: &Token) -> Result<Term, ParseError>
{
    Ok(match tok
    {
        Token::Dot => Term::Dot,
        Token::Field(parts) => Term::Field(parts.clone()),
        Token::String(s) => Term::String(s.clone()),
        Token::Int(i) => Term::Int(*i),
        Token::Float(f) => Term::Float(*f),
        Token::Bool(b) => Term::Bool(*b),
        Token::Ident(name) => Term::Field(vec![name.clone()]),
        Token::Paren(inner) => Term::Pipeline(Box::new(parse_pipeline(inner)?)),
    })
}

fn tokenize(s: &str) -> Result<Vec<Token>, ParseError>
{
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len()
    {
        let c = bytes[i] as char;

        if c.is_whitespace()
        {
            i += 1;
            continue;
        }

        if c == '"'
        {
            let mut j = i + 1;
            let mut buf = String::new();

            while j < bytes.len() && bytes[j] != b'"'
            {
                if bytes[j] == b'\\' && j + 1 < bytes.len()
                {
                    buf.push(bytes[j + 1] as char);
                    j += 2;
                }
                else
                {
                    buf.push(bytes[j] as char);
                    j += 1;
                }
            }

            if j >= bytes.len()
            {
                return Err(ParseError("unterminated string literal".into()));
            }

            out.push(Token::String(buf));
            i = j + 1;
            continue;
        }

        if c == '('
        {
            let mut depth = 1;
            let mut j = i + 1;

            while j < bytes.len() && depth > 0
            {
                match bytes[j] as char
                {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ =>
                    {},
                }

                j += 1;
            }

            if depth != 0
            {
                return Err(ParseError("unbalanced parentheses".into()));
            }

            out.push(Token::Paren(s[i + 1..j - 1].to_string()));
            i = j;
            continue;
        }

        if c == '.'
        {
            let mut j = i + 1;

            while j < bytes.len() && is_field_char(bytes[j] as char)
            {
                j += 1;
            }

            if j == i + 1
            {
                out.push(Token::Dot);
            }
            else
            {
                let parts = s[i + 1..j].split('.').map(str::to_string).collect();
                out.push(Token::Field(parts));
            }

            i = j;
            continue;
        }

        let start = i;

        while i < bytes.len() && !(bytes[i] as char).is_whitespace() && bytes[i] != b'|'
        {
            i += 1;
        }

        let word = &s[start..i];

        out.push(match word
        {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ =>
            {
                if let Ok(v) = word.parse::<i64>()
                {
                    Token::Int(v)
                }
                else if let Ok(v) = word.parse::<f64>()
                {
                    Token::Float(v)
                }
                else
                {
                    Token::Ident(word.to_string())
                }
            },
        });
    }

    Ok(out)
}

fn is_field_char(c: char) -> bool
{
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Splits `s` on `sep` outside of any quotes or parentheses.
fn split_top_level(s: &str, sep: char) -> Vec<&str>
{
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0;
    let bytes = s.as_bytes();

    for (i, &b) in bytes.iter().enumerate()
    {
        match b as char
        {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            c if c == sep && !in_quote && depth == 0 =>
            {
                out.push(&s[start..i]);
                start = i + 1;
            },
            _ =>
            {},
        }
    }

    out.push(&s[start..]);

    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn parse_default(src: &str) -> Vec<Node>
    {
        parse(src, "{{", "}}").expect("parses")
    }

    #[test]
    fn plain_text_is_untouched()
    {
        let nodes = parse_default("hello world");

        assert!(matches!(&nodes[0], Node::Text(t) if t == "hello world"));
    }

    #[test]
    fn field_access_action()
    {
        let nodes = parse_default("hello {{ .Name }}");

        let Node::Action(pipeline) = &nodes[1]
        else
        {
            panic!("expected action")
        };

        assert!(matches!(
            &pipeline.commands[0].args[0],
            Term::Field(parts) if parts == &["Name"]
        ));
    }

    #[test]
    fn piped_function_call()
    {
        let nodes = parse_default("{{ .x | AllowFlags }}");

        let Node::Action(pipeline) = &nodes[0]
        else
        {
            panic!("expected action")
        };

        assert_eq!(pipeline.commands.len(), 2);
        assert_eq!(pipeline.commands[1].func.as_deref(), Some("AllowFlags"));
    }

    #[test]
    fn if_else_end()
    {
        let nodes = parse_default("{{ if .ok }}yes{{ else }}no{{ end }}");

        assert!(matches!(&nodes[0], Node::If { else_body: Some(_), .. }));
    }

    #[test]
    fn range_over_field()
    {
        let nodes = parse_default("{{ range .Items }}{{ . }}{{ end }}");

        assert!(matches!(&nodes[0], Node::Range { .. }));
    }
}
