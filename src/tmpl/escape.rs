/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! HTML/JS/URL escapers, forwarded verbatim per spec section 6. These
//! are not this crate's injection defense -- that's the judges -- they
//! exist so templates migrating from `html/template` keep access to the
//! same `html`/`js`/`urlquery` pipeline functions.

use percent_encoding::{AsciiSet, CONTROLS};

pub fn html_escape(s: &str) -> String
{
    html_escape::encode_text(s).into_owned()
}

/// Escapes a string for embedding inside a `<script>` block or inline
/// JS attribute, matching `html/template`'s `js` escaper's character
/// set (quotes, backslash, angle brackets, ampersand, line separators).
pub fn js_escape(s: &str) -> String
{
    let mut out = String::with_capacity(s.len());

    for c in s.chars()
    {
        match c
        {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }

    out
}

const URL_QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn url_query_escape(s: &str) -> String
{
    percent_encoding::utf8_percent_encode(s, URL_QUERY).to_string()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn html_escapes_angle_brackets()
    {
        assert_eq!(html_escape("<b>"), "&lt;b&gt;");
    }

    #[test]
    fn js_escapes_quotes_and_closing_tag()
    {
        assert_eq!(js_escape("</script>"), "\\u003C/script\\u003E");
    }

    #[test]
    fn url_query_escapes_space_and_ampersand()
    {
        assert_eq!(url_query_escape("a b&c"), "a%20b%26c");
    }
}
