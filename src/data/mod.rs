/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! Caller data: the graph the template engine walks, and the mutator
//! that produces the baseline/mutated variants the judges compare
//! against it.

pub mod from_serde;
pub mod value;

pub(crate) mod mutator;

pub use from_serde::from_serde;
pub use value::{Data, Value, ValueId};
