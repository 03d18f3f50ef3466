/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Injection-safe YAML templating: the YAML instance of the differential
//! structural equivalence engine described at the crate root.

pub(crate) mod judge;
pub(crate) mod tree;

pub mod error;
pub mod template;

pub use error::YamlError;
pub use template::Template;
