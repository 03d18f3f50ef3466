/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Injection-safe templating for YAML and POSIX/Bash shell output.
//!
//! A hosted `text/template`-style engine ([`tmpl`]) renders every
//! template three ways -- a placeholder baseline, the honest rendering,
//! and (where the format needs a third witness) a mutated rendering --
//! and only releases the honest bytes once a format-specific judge
//! ([`yaml`], [`sh`]) has confirmed all renderings parse to
//! structurally equivalent trees. See [`orchestrator`] for the state
//! machine that drives this.
//!
//! The underlying YAML event/scanner/reader pipeline that the judges'
//! grammars are built on is exposed under [`event`] and [`reader`] for
//! callers that only need a YAML parser.

#![allow(dead_code)]
#![allow(clippy::suspicious_else_formatting)]

pub mod event;
pub mod reader;
pub mod sh;
pub mod yaml;

pub(crate) mod data;
pub(crate) mod fault;
pub(crate) mod orchestrator;
pub(crate) mod tmpl;

mod error;
mod queue;
mod scanner;
mod token;

pub use sh::{ShError, Template as ShTemplate};
pub use yaml::{Template as YamlTemplate, YamlError};
