/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Injection-safe shell templating: the POSIX/Bash instance of the
//! differential structural equivalence engine described at the crate
//! root, plus the standalone `printf`-style construction facade.

pub(crate) mod ast;
pub(crate) mod judge;
pub(crate) mod lower;

pub mod error;
pub mod printf;
pub mod template;

pub use error::ShError;
pub use printf::{escape_default_context, must_sprintf, sprintf, SprintfLang};
pub use template::Template;
