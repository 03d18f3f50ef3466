/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The hosted, unsafe template engine and the marked expansion driver
//! that wraps it. Not part of this crate's public API: the only safe
//! entry points are the per-format facades in [`crate::yaml`] and
//! [`crate::sh`].

pub(crate) mod ast;
pub(crate) mod engine;
pub(crate) mod escape;
pub(crate) mod exec;
pub(crate) mod parse;
pub(crate) mod policy;

pub use escape::{html_escape, js_escape, url_query_escape};
pub use exec::{ExecError, FuncMap, RuntimeValue};
