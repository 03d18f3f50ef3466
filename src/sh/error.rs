/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Public error type shared by the shell-template and shell-printf
//! facades, spec section 7.

use std::{error::Error as StdError, fmt, io};

use crate::tmpl::exec::ExecError;

/// All errors the shell facades (`crate::sh::template`, `crate::sh::printf`)
/// can return.
#[derive(Debug)]
pub enum ShError
{
    /// The baseline rendering failed to parse as shell syntax. The
    /// template is unusable regardless of the data supplied.
    InvalidTemplate(String),

    /// The honest or mutated rendering failed to parse, or the judge
    /// found the parsed trees structurally inequivalent. Treated as an
    /// attempted injection.
    Injection(String),

    /// The underlying template engine raised an execution error;
    /// surfaced unchanged.
    Exec(ExecError),

    /// A writer I/O error at the emit step; surfaced unchanged.
    Io(io::Error),
}

impl fmt::Display for ShError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            ShError::InvalidTemplate(msg) => write!(f, "invalid shell template: {msg}"),
            ShError::Injection(msg) => write!(f, "rejected as a possible shell injection: {msg}"),
            ShError::Exec(e) => fmt::Display::fmt(e, f),
            ShError::Io(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for ShError
{
    fn source(&self) -> Option<&(dyn StdError + 'static)>
    {
        match self
        {
            ShError::InvalidTemplate(_) | ShError::Injection(_) => None,
            ShError::Exec(e) => Some(e),
            ShError::Io(e) => Some(e),
        }
    }
}

impl From<ExecError> for ShError
{
    fn from(e: ExecError) -> Self
    {
        ShError::Exec(e)
    }
}

impl From<io::Error> for ShError
{
    fn from(e: io::Error) -> Self
    {
        ShError::Io(e)
    }
}
