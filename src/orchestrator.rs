/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The per-execution state machine, spec section 4.5.
//!
//! Renders the honest output, a baseline (every data site replaced by a
//! fixed placeholder), and -- for formats that need a third witness --
//! a mutated rendering (every reachable string rune-doubled), parses
//! each with the format's own grammar, and only returns the honest
//! bytes once the format's judge has accepted all three as
//! structurally equivalent. A fault anywhere in this pipeline (a parse
//! panic, a judge panic) is caught by [`crate::fault::guard`] and
//! treated the same as a judge rejection.

use crate::{
    data::value::{Data, ValueId},
    fault,
    tmpl::{
        engine::Engine,
        exec::{ExecError, Output},
        policy::Policy,
    },
};

pub(crate) enum Verdict
{
    Equivalent,
    Injection,
    InvalidTemplate,
}

/// What a format (YAML, shell-template, shell-printf) plugs into the
/// orchestrator: its own parse tree type, its own public error type,
/// and whether it needs the third (mutated) rendering at all -- the
/// shell-printf facade only ever does a two-way baseline/honest
/// comparison (spec.md 4.3).
pub(crate) trait Format
{
    type Tree;
    type Error: From<ExecError>;

    const THREE_WAY: bool;

    /// Parses one rendering. Receives the full [`Output`] (text and
    /// per-leaf spans), not just the bytes -- the shell judge needs the
    /// honest rendering's own spans to resolve `AllowFlags` call sites
    /// back to the words it parses out of that same text.
    fn parse(output: &Output) -> Result<Self::Tree, String>;

    fn judge(baseline: &Self::Tree, requested: &Self::Tree, mutated: Option<&Self::Tree>) -> Verdict;

    fn invalid_template(detail: String) -> Self::Error;

    fn injection(detail: String) -> Self::Error;
}

pub(crate) fn execute<F: Format>(
    engine: &Engine,
    template_name: Option<&str>,
    data: &Data,
) -> Result<String, F::Error>
{
    let dot = data.root();

    let outcome = fault::guard(|| run::<F>(engine, template_name, data, dot));

    match outcome
    {
        Ok(inner) => inner,
        Err(()) => Err(F::injection("a fault occurred while rendering or comparing".into())),
    }
}

fn run<F: Format>(
    engine: &Engine,
    template_name: Option<&str>,
    data: &Data,
    dot: ValueId,
) -> Result<String, F::Error>
{
    let baseline = render::<F>(engine, template_name, data, dot, Policy::Baseline)?;
    let baseline_tree = F::parse(&baseline).map_err(F::invalid_template)?;

    let honest = render::<F>(engine, template_name, data, dot, Policy::Identity)?;
    let honest_tree = F::parse(&honest).map_err(F::injection)?;

    let mutated_tree = if F::THREE_WAY
    {
        let mutated = render::<F>(engine, template_name, data, dot, Policy::Mutated)?;

        Some(F::parse(&mutated).map_err(F::injection)?)
    }
    else
    {
        None
    };

    match F::judge(&baseline_tree, &honest_tree, mutated_tree.as_ref())
    {
        Verdict::Equivalent => Ok(honest.text),
        Verdict::Injection => Err(F::injection(
            "requested rendering is not structurally equivalent to the template's baseline".into(),
        )),
        Verdict::InvalidTemplate => Err(F::invalid_template(
            "a mapping or sequence was used where only a scalar is permitted".into(),
        )),
    }
}

fn render<F: Format>(
    engine: &Engine,
    template_name: Option<&str>,
    data: &Data,
    dot: ValueId,
    policy: Policy,
) -> Result<Output, F::Error>
{
    engine
        .execute_raw(template_name, data, dot, policy)
        .map_err(F::Error::from)
}
