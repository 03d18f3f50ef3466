/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Public error type for the YAML facade, spec section 7.
//!
//! Two kinds are ever returned for a rejected template/data pair --
//! `InvalidTemplate` and `Injection` -- plus passthroughs for the two
//! failures that are not this crate's business to reinterpret: the
//! underlying template engine's own execution errors, and I/O errors at
//! the emit step.

use std::{error::Error as StdError, fmt, io};

use crate::{tmpl::exec::ExecError, yaml::judge::Verdict};

/// All errors the YAML template facade can return.
#[derive(Debug)]
pub enum YamlError
{
    /// The baseline rendering (every data site replaced by a fixed
    /// placeholder) failed to parse as YAML, or a mapping/sequence was
    /// used as a mapping key. The template is unusable regardless of
    /// the data supplied.
    InvalidTemplate(String),

    /// The honest or mutated rendering failed to parse, or the judge
    /// found the parsed trees structurally inequivalent. Treated as an
    /// attempted injection.
    Injection(String),

    /// The underlying template engine raised an execution error
    /// (missing function, index out of range, and so on); surfaced
    /// unchanged.
    Exec(ExecError),

    /// A writer I/O error at the emit step; surfaced unchanged.
    Io(io::Error),
}

impl YamlError
{
    pub(crate) fn from_verdict(verdict: Verdict, context: &'static str) -> Self
    {
        match verdict
        {
            Verdict::Equivalent => unreachable!("caller only invokes this on a non-equivalent verdict"),
            Verdict::Injection => YamlError::Injection(context.to_string()),
            Verdict::InvalidTemplate => YamlError::InvalidTemplate(context.to_string()),
        }
    }
}

impl fmt::Display for YamlError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            YamlError::InvalidTemplate(msg) => write!(f, "invalid yaml template: {msg}"),
            YamlError::Injection(msg) => write!(f, "rejected as a possible yaml injection: {msg}"),
            YamlError::Exec(e) => fmt::Display::fmt(e, f),
            YamlError::Io(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for YamlError
{
    fn source(&self) -> Option<&(dyn StdError + 'static)>
    {
        match self
        {
            YamlError::InvalidTemplate(_) | YamlError::Injection(_) => None,
            YamlError::Exec(e) => Some(e),
            YamlError::Io(e) => Some(e),
        }
    }
}

impl From<ExecError> for YamlError
{
    fn from(e: ExecError) -> Self
    {
        YamlError::Exec(e)
    }
}

impl From<io::Error> for YamlError
{
    fn from(e: io::Error) -> Self
    {
        YamlError::Io(e)
    }
}
