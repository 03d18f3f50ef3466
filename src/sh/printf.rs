/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Injection-safe `fmt.Sprintf`-style shell command construction, spec
//! section 6 / 4.3's `printf` variant.
//!
//! Unlike [`crate::sh::template`], this facade never touches the hosted
//! template engine or a caller-supplied [`crate::data::value::Data`]
//! graph: "ordinary formatted substitution" (spec.md 4.5) replaces the
//! whole render step, and injection detection is a regular-expression
//! relation over the rendered text rather than a parsed-tree walk (spec
//! section 4.3's printf paragraph literally describes converting each
//! baseline literal to a regex, not re-parsing a grammar). `%s`/`%v`
//! verbs are supported, matching the two `fmt` verbs safetext's upstream
//! supports for string arguments.

use std::collections::VecDeque;

use regex::Regex;

use crate::{fault, sh::error::ShError};

const PLACEHOLDER: &str = "REPLACEABLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintfLang
{
    Posix,
    Bash,
    Mksh,
    Bats,
}

#[derive(Debug)]
enum FormatError
{
    TruncatedVerb,
    UnsupportedVerb(char),
    TooFewArgs,
    TooManyArgs,
}

impl std::fmt::Display for FormatError
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            FormatError::TruncatedVerb => f.write_str("format string ends with a bare '%'"),
            FormatError::UnsupportedVerb(c) => write!(f, "unsupported format verb '%{c}'"),
            FormatError::TooFewArgs => f.write_str("not enough arguments for format string"),
            FormatError::TooManyArgs => f.write_str("too many arguments for format string"),
        }
    }
}

/// Shell special characters escaped by [`escape_default_context`]:
/// `\'"` `` ` `` `$[|&;<>()*?!+@`. Whitespace and a leading `~` are
/// escaped separately since they aren't fixed characters.
const SPECIAL_CHARS: &[char] = &[
    '\\', '\'', '"', '`', '$', '[', '|', '&', ';', '<', '>', '(', ')', '*', '?', '!', '+', '@',
];

/// Escapes `s` for safe inclusion as a single shell word under `lang`'s
/// default context: backslash-escapes each character in the shell
/// special-character set, whitespace, and a leading `~`, leaving
/// everything else untouched.
pub fn escape_default_context(_lang: SprintfLang, s: &str) -> String
{
    let mut out = String::with_capacity(s.len());

    for (i, c) in s.chars().enumerate()
    {
        if SPECIAL_CHARS.contains(&c) || c.is_whitespace() || (i == 0 && c == '~')
        {
            out.push('\\');
        }

        out.push(c);
    }

    out
}

/// Renders `format` with `lang`-escaped `args` substituted at each
/// `%s`/`%v` site, rejecting the result unless the judge finds it
/// structurally equivalent to a placeholder-substituted baseline.
pub fn sprintf(lang: SprintfLang, format: &str, args: &[&str]) -> Result<String, ShError>
{
    fault::guard(|| sprintf_inner(lang, format, args))
        .unwrap_or_else(|()| Err(ShError::Injection("a fault occurred while rendering or comparing".into())))
}

/// Panics if `sprintf` returns an error; mirrors `MustSprintf` in
/// upstream `safetext/shsprintf`.
pub fn must_sprintf(lang: SprintfLang, format: &str, args: &[&str]) -> String
{
    match sprintf(lang, format, args)
    {
        Ok(s) => s,
        Err(e) => panic!("guardtext::sh::printf: {e}"),
    }
}

fn sprintf_inner(lang: SprintfLang, format: &str, args: &[&str]) -> Result<String, ShError>
{
    let honest_values: VecDeque<String> = args.iter().map(|a| escape_default_context(lang, a)).collect();
    let honest = render(format, honest_values).map_err(|e| ShError::InvalidTemplate(e.to_string()))?;

    let stripped = strip_specifiers(format);
    let baseline_values: VecDeque<String> = (0..args.len()).map(|_| PLACEHOLDER.to_string()).collect();
    let baseline = render(&stripped, baseline_values).map_err(|e| ShError::InvalidTemplate(e.to_string()))?;

    match judge(&baseline, &honest)
    {
        Verdict::Equivalent => Ok(honest),
        Verdict::Injection => Err(ShError::Injection(
            "an argument did not match the shape expected at its placeholder position".into(),
        )),
    }
}

/// Strips flag/width/precision qualifiers from every `%s`/`%v` verb so
/// the baseline placeholder is substituted in full rather than truncated
/// or padded (spec.md 4.5).
fn strip_specifiers(format: &str) -> String
{
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next()
    {
        if c != '%'
        {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%')
        {
            out.push('%');
            out.push(chars.next().unwrap());
            continue;
        }

        out.push('%');

        while let Some(&p) = chars.peek()
        {
            if p.is_ascii_digit() || matches!(p, '.' | '-' | '+' | ' ' | '#' | '0')
            {
                chars.next();
            }
            else
            {
                break;
            }
        }

        if let Some(verb) = chars.next()
        {
            out.push(verb);
        }
    }

    out
}

fn render(format: &str, mut values: VecDeque<String>) -> Result<String, FormatError>
{
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next()
    {
        if c != '%'
        {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%')
        {
            out.push('%');
            chars.next();
            continue;
        }

        while let Some(&p) = chars.peek()
        {
            if p.is_ascii_digit() || matches!(p, '.' | '-' | '+' | ' ' | '#' | '0')
            {
                chars.next();
            }
            else
            {
                break;
            }
        }

        let verb = chars.next().ok_or(FormatError::TruncatedVerb)?;

        match verb
        {
            's' | 'v' =>
            {
                let value = values.pop_front().ok_or(FormatError::TooFewArgs)?;

                out.push_str(&value);
            },
            other => return Err(FormatError::UnsupportedVerb(other)),
        }
    }

    if !values.is_empty()
    {
        return Err(FormatError::TooManyArgs);
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict
{
    Equivalent,
    Injection,
}

fn judge(baseline: &str, honest: &str) -> Verdict
{
    let pattern = build_pattern(baseline);
    let re = Regex::new(&pattern).expect("pattern built entirely from escaped literals is always valid");

    match re.captures(honest)
    {
        None => Verdict::Injection,
        Some(caps) =>
        {
            for cap in caps.iter().skip(1).flatten()
            {
                if !no_unescaped_glob_chars(cap.as_str())
                {
                    return Verdict::Injection;
                }
            }

            Verdict::Equivalent
        },
    }
}

fn build_pattern(baseline: &str) -> String
{
    let mut pattern = String::from("^");
    let mut rest = baseline;

    while let Some(idx) = rest.find(PLACEHOLDER)
    {
        pattern.push_str(&regex::escape(&rest[..idx]));
        pattern.push_str("(.*?)");
        rest = &rest[idx + PLACEHOLDER.len()..];
    }

    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    pattern
}

/// spec.md 4.3: "a single character is an escape only if preceded by
/// `\`; a trailing `\` is itself rejected".
fn no_unescaped_glob_chars(s: &str) -> bool
{
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    while i < chars.len()
    {
        if chars[i] == '\\'
        {
            if i + 1 >= chars.len()
            {
                return false;
            }

            i += 2;
            continue;
        }

        if matches!(chars[i], '?' | '*' | '+' | '@' | '!')
        {
            return false;
        }

        i += 1;
    }

    true
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn plain_argument_is_accepted()
    {
        let out = sprintf(SprintfLang::Bash, "rm %s", &["file.txt"]).unwrap();

        assert_eq!(out, "rm file.txt");
    }

    #[test]
    fn embedded_quote_is_escaped_and_accepted()
    {
        let out = sprintf(SprintfLang::Bash, "echo %s", &["it's fine"]).unwrap();

        assert_eq!(out, "echo it\\'s\\ fine");
    }

    #[test]
    fn glob_characters_in_argument_are_escaped_and_accepted()
    {
        let out = sprintf(SprintfLang::Bash, "rm %s", &["*"]).unwrap();

        assert_eq!(out, "rm \\*");
    }

    #[test]
    fn width_specifier_does_not_change_baseline_shape()
    {
        let out = sprintf(SprintfLang::Posix, "echo %10s", &["hi"]).unwrap();

        assert_eq!(out, "echo hi");
    }

    #[test]
    fn judge_rejects_unescaped_glob_capture()
    {
        let v = judge("echo REPLACEABLE", "echo *");

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn must_sprintf_panics_on_too_few_args()
    {
        let result = std::panic::catch_unwind(|| must_sprintf(SprintfLang::Bash, "rm %s", &[]));

        assert!(result.is_err());
    }
}
