/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The marked expansion driver, spec section 4.2.
//!
//! Every data-access leaf in a rendered template is rendered under one
//! of three policies. `Execute` picks the policy for the whole pass;
//! `StructuralData`/`ApplyInjectionDetection` let a template author
//! override the policy at a single call site (to declare that a
//! sub-pipeline's result should never be treated as free-form string
//! data, or that a helper's return value needs the same treatment as a
//! direct field access), and `AllowFlags` marks a site where a leading
//! `-`/`--` in the value is expected and should not, on its own, be
//! treated as a structural change by the shell judge.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy
{
    /// Render the real value.
    Identity,
    /// Render the fixed placeholder regardless of the real value.
    Baseline,
    /// Render the value with every reachable string rune-doubled.
    Mutated,
}

impl Policy
{
    pub(crate) fn transform(&self, s: &str) -> String
    {
        match self
        {
            Policy::Identity => s.to_string(),
            Policy::Baseline => crate::data::mutator::placeholder(s),
            Policy::Mutated => crate::data::mutator::double_runes(s),
        }
    }
}

/// Per-site override recorded by a sentinel function call wrapping a
/// pipeline stage. `Plain` sites just inherit the pass's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SiteMarker
{
    Plain,
    /// `StructuralData`: this value contributes to document shape, not
    /// string content -- the expansion driver must not mutate it even
    /// under the `Mutated` policy (spec.md 4.2).
    StructuralData,
    /// `AllowFlags`: the shell judge should not flag a leading
    /// dash/double-dash at this site as a structural change.
    AllowFlags,
    /// `ApplyInjectionDetection`: a helper-returned value should be
    /// walked (and mutated/placeheld) exactly like a direct field
    /// access, rather than treated as already-safe template output.
    ApplyInjectionDetection,
}

pub(crate) const SENTINEL_NAMES: &[&str] =
    &["StructuralData", "AllowFlags", "ApplyInjectionDetection"];

pub(crate) fn marker_for(name: &str) -> Option<SiteMarker>
{
    match name
    {
        "StructuralData" => Some(SiteMarker::StructuralData),
        "AllowFlags" => Some(SiteMarker::AllowFlags),
        "ApplyInjectionDetection" => Some(SiteMarker::ApplyInjectionDetection),
        _ => None,
    }
}
