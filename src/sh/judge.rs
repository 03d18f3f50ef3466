/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The shell structural equivalence judge, spec section 4.3's `template`
//! (3-way) variant.
//!
//! Compares baseline/honest/mutated command lists node-by-node. Every
//! node pair must share a kind and its non-payload attributes
//! (operators, reserved-word bits, the backquote-form bit, `until`/
//! `select` flags); payload (string) leaves are compared under one of
//! three contexts chosen by where the leaf sits syntactically, per
//! spec.md 4.3.

use std::ops::Range;

use crate::{
    sh::ast::{Assignment, AssignValue, CaseArm, Command, ParamModifier, Redirect, TestExpr, Word, WordPart},
    tmpl::exec::Span,
    tmpl::policy::SiteMarker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict
{
    Equivalent,
    Injection,
}

/// Chooses how a payload (string) leaf is compared, spec.md 4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx
{
    /// Command-name word, redirection targets, heredoc bodies.
    MatchExactly,
    /// Non-first call arguments, unless the site was marked `AllowFlags`.
    ForbidFlagInjection,
    /// Conditions, loop iterators, arithmetic operands, case patterns,
    /// assignment RHS, test operands.
    JustStructure,
}

pub(crate) fn judge(
    baseline: &[Command],
    requested: &[Command],
    mutated: &[Command],
    honest_spans: &[Span],
) -> Verdict
{
    if baseline.len() != requested.len() || baseline.len() != mutated.len()
    {
        return Verdict::Injection;
    }

    let walk = Walk { honest_spans };

    for ((b, r), m) in baseline.iter().zip(requested).zip(mutated)
    {
        if walk.command(b, r, m) == Verdict::Injection
        {
            return Verdict::Injection;
        }
    }

    Verdict::Equivalent
}

struct Walk<'a>
{
    honest_spans: &'a [Span],
}

macro_rules! req {
    ($cond:expr) => {
        if !$cond
        {
            return Verdict::Injection;
        }
    };
}

impl<'a> Walk<'a>
{
    fn commands(&self, b: &[Command], r: &[Command], m: &[Command]) -> Verdict
    {
        req!(b.len() == r.len() && b.len() == m.len());

        for ((bc, rc), mc) in b.iter().zip(r).zip(m)
        {
            if self.command(bc, rc, mc) == Verdict::Injection
            {
                return Verdict::Injection;
            }
        }

        Verdict::Equivalent
    }

    fn command(&self, b: &Command, r: &Command, m: &Command) -> Verdict
    {
        match (b, r, m)
        {
            (Command::Simple(b), Command::Simple(r), Command::Simple(m)) => self.simple(b, r, m),
            (
                Command::Pipeline { stages: bs, negated: bn, time: bt },
                Command::Pipeline { stages: rs, negated: rn, time: rt },
                Command::Pipeline { stages: ms, negated: mn, time: mt },
            ) =>
            {
                req!(bn == rn && bn == mn);
                req!(bt == rt && bt == mt);

                self.commands(bs, rs, ms)
            },
            (
                Command::List { left: bl, op: bo, right: br },
                Command::List { left: rl, op: ro, right: rr },
                Command::List { left: ml, op: mo, right: mr },
            ) =>
            {
                req!(bo == ro && bo == mo);

                or_reject(self.command(bl, rl, ml), self.command(br, rr, mr))
            },
            (
                Command::If { branches: bb, else_body: be },
                Command::If { branches: rb, else_body: re },
                Command::If { branches: mb, else_body: me },
            ) =>
            {
                req!(bb.len() == rb.len() && bb.len() == mb.len());

                for ((b, r), m) in bb.iter().zip(rb).zip(mb)
                {
                    req!(self.commands(&b.0, &r.0, &m.0) == Verdict::Equivalent);
                    req!(self.commands(&b.1, &r.1, &m.1) == Verdict::Equivalent);
                }

                self.opt_body(be, re, me)
            },
            (
                Command::While { cond: bc, body: bb, until: bu },
                Command::While { cond: rc, body: rb, until: ru },
                Command::While { cond: mc, body: mb, until: mu },
            ) =>
            {
                req!(bu == ru && bu == mu);

                or_reject(self.commands(bc, rc, mc), self.commands(bb, rb, mb))
            },
            (
                Command::For { var: bv, words: bw, body: bb },
                Command::For { var: rv, words: rw, body: rb },
                Command::For { var: mv, words: mw, body: mb },
            ) =>
            {
                req!(bv == rv && bv == mv);
                req!(self.words(bw, rw, mw, Ctx::JustStructure) == Verdict::Equivalent);

                self.commands(bb, rb, mb)
            },
            (
                Command::Select { var: bv, words: bw, body: bb },
                Command::Select { var: rv, words: rw, body: rb },
                Command::Select { var: mv, words: mw, body: mb },
            ) =>
            {
                req!(bv == rv && bv == mv);
                req!(self.words(bw, rw, mw, Ctx::JustStructure) == Verdict::Equivalent);

                self.commands(bb, rb, mb)
            },
            (
                Command::CStyleFor { init: bi, cond: bc, update: bu, body: bb },
                Command::CStyleFor { init: ri, cond: rc, update: ru, body: rb },
                Command::CStyleFor { init: mi, cond: mc, update: mu, body: mb },
            ) =>
            {
                req!(bi.is_some() == ri.is_some() && bi.is_some() == mi.is_some());
                req!(bc.is_some() == rc.is_some() && bc.is_some() == mc.is_some());
                req!(bu.is_some() == ru.is_some() && bu.is_some() == mu.is_some());

                self.commands(bb, rb, mb)
            },
            (
                Command::Case { word: bw, arms: ba },
                Command::Case { word: rw, arms: ra },
                Command::Case { word: mw, arms: ma },
            ) =>
            {
                req!(self.word(bw, rw, mw, Ctx::JustStructure) == Verdict::Equivalent);
                req!(ba.len() == ra.len() && ba.len() == ma.len());

                for ((b, r), m) in ba.iter().zip(ra).zip(ma)
                {
                    if self.case_arm(b, r, m) == Verdict::Injection
                    {
                        return Verdict::Injection;
                    }
                }

                Verdict::Equivalent
            },
            (
                Command::FunctionDef { name: bn, body: bb },
                Command::FunctionDef { name: rn, body: rb },
                Command::FunctionDef { name: mn, body: mb },
            ) =>
            {
                req!(bn == rn && bn == mn);

                self.command(bb, rb, mb)
            },
            (Command::Subshell(b), Command::Subshell(r), Command::Subshell(m)) =>
            {
                self.commands(b, r, m)
            },
            (Command::Group(b), Command::Group(r), Command::Group(m)) =>
            {
                self.commands(b, r, m)
            },
            (Command::Test(b), Command::Test(r), Command::Test(m)) => self.test_expr(b, r, m),
            (Command::Arithmetic(_), Command::Arithmetic(_), Command::Arithmetic(_)) =>
            {
                Verdict::Equivalent
            },
            (
                Command::Declaration { keyword: bk, assignments: ba },
                Command::Declaration { keyword: rk, assignments: ra },
                Command::Declaration { keyword: mk, assignments: ma },
            ) =>
            {
                req!(bk == rk && bk == mk);

                self.assignments(ba, ra, ma)
            },
            (
                Command::Coproc { name: bn, body: bb },
                Command::Coproc { name: rn, body: rb },
                Command::Coproc { name: mn, body: mb },
            ) =>
            {
                req!(bn == rn && bn == mn);

                self.command(bb, rb, mb)
            },
            _ => Verdict::Injection,
        }
    }

    fn opt_body(
        &self,
        b: &Option<Vec<Command>>,
        r: &Option<Vec<Command>>,
        m: &Option<Vec<Command>>,
    ) -> Verdict
    {
        match (b, r, m)
        {
            (None, None, None) => Verdict::Equivalent,
            (Some(b), Some(r), Some(m)) => self.commands(b, r, m),
            _ => Verdict::Injection,
        }
    }

    fn simple(
        &self,
        b: &crate::sh::ast::SimpleCommand,
        r: &crate::sh::ast::SimpleCommand,
        m: &crate::sh::ast::SimpleCommand,
    ) -> Verdict
    {
        req!(self.assignments(&b.assignments, &r.assignments, &m.assignments) == Verdict::Equivalent);

        match (&b.name, &r.name, &m.name)
        {
            (None, None, None) => {},
            (Some(b), Some(r), Some(m)) =>
            {
                req!(self.word(b, r, m, Ctx::MatchExactly) == Verdict::Equivalent);
            },
            _ => return Verdict::Injection,
        }

        req!(b.args.len() == r.args.len() && b.args.len() == m.args.len());

        for ((b, r), m) in b.args.iter().zip(&r.args).zip(&m.args)
        {
            if self.word(b, r, m, Ctx::ForbidFlagInjection) == Verdict::Injection
            {
                return Verdict::Injection;
            }
        }

        req!(b.redirects.len() == r.redirects.len() && b.redirects.len() == m.redirects.len());

        for ((b, r), m) in b.redirects.iter().zip(&r.redirects).zip(&m.redirects)
        {
            if self.redirect(b, r, m) == Verdict::Injection
            {
                return Verdict::Injection;
            }
        }

        Verdict::Equivalent
    }

    fn redirect(&self, b: &Redirect, r: &Redirect, m: &Redirect) -> Verdict
    {
        req!(b.fd == r.fd && b.fd == m.fd);
        req!(b.kind == r.kind && b.kind == m.kind);
        req!(b.heredoc_body == r.heredoc_body && b.heredoc_body == m.heredoc_body);

        self.word(&b.target, &r.target, &m.target, Ctx::MatchExactly)
    }

    fn assignments(&self, b: &[Assignment], r: &[Assignment], m: &[Assignment]) -> Verdict
    {
        req!(b.len() == r.len() && b.len() == m.len());

        for ((b, r), m) in b.iter().zip(r).zip(m)
        {
            req!(b.name == r.name && b.name == m.name);
            req!(b.op == r.op && b.op == m.op);

            match (&b.index, &r.index, &m.index)
            {
                (None, None, None) => {},
                (Some(b), Some(r), Some(m)) =>
                {
                    req!(self.word(b, r, m, Ctx::JustStructure) == Verdict::Equivalent);
                },
                _ => return Verdict::Injection,
            }

            match (&b.value, &r.value, &m.value)
            {
                (None, None, None) => {},
                (Some(AssignValue::Scalar(b)), Some(AssignValue::Scalar(r)), Some(AssignValue::Scalar(m))) =>
                {
                    req!(self.word(b, r, m, Ctx::JustStructure) == Verdict::Equivalent);
                },
                (Some(AssignValue::Array(b)), Some(AssignValue::Array(r)), Some(AssignValue::Array(m))) =>
                {
                    req!(self.words(b, r, m, Ctx::JustStructure) == Verdict::Equivalent);
                },
                _ => return Verdict::Injection,
            }
        }

        Verdict::Equivalent
    }

    fn case_arm(&self, b: &CaseArm, r: &CaseArm, m: &CaseArm) -> Verdict
    {
        or_reject(
            self.words(&b.patterns, &r.patterns, &m.patterns, Ctx::JustStructure),
            self.commands(&b.body, &r.body, &m.body),
        )
    }

    fn test_expr(&self, b: &TestExpr, r: &TestExpr, m: &TestExpr) -> Verdict
    {
        match (b, r, m)
        {
            (
                TestExpr::Unary { op: bo, operand: bw },
                TestExpr::Unary { op: ro, operand: rw },
                TestExpr::Unary { op: mo, operand: mw },
            ) =>
            {
                req!(bo == ro && bo == mo);

                self.word(bw, rw, mw, Ctx::JustStructure)
            },
            (
                TestExpr::Binary { op: bo, lhs: bl, rhs: br },
                TestExpr::Binary { op: ro, lhs: rl, rhs: rr },
                TestExpr::Binary { op: mo, lhs: ml, rhs: mr },
            ) =>
            {
                req!(bo == ro && bo == mo);

                or_reject(
                    self.word(bl, rl, ml, Ctx::JustStructure),
                    self.word(br, rr, mr, Ctx::JustStructure),
                )
            },
            (TestExpr::And(bl, br), TestExpr::And(rl, rr), TestExpr::And(ml, mr))
            | (TestExpr::Or(bl, br), TestExpr::Or(rl, rr), TestExpr::Or(ml, mr)) =>
            {
                or_reject(self.test_expr(bl, rl, ml), self.test_expr(br, rr, mr))
            },
            (TestExpr::Not(b), TestExpr::Not(r), TestExpr::Not(m))
            | (TestExpr::Group(b), TestExpr::Group(r), TestExpr::Group(m)) =>
            {
                self.test_expr(b, r, m)
            },
            (TestExpr::Word(b), TestExpr::Word(r), TestExpr::Word(m)) =>
            {
                self.word(b, r, m, Ctx::JustStructure)
            },
            _ => Verdict::Injection,
        }
    }

    fn words(&self, b: &[Word], r: &[Word], m: &[Word], ctx: Ctx) -> Verdict
    {
        req!(b.len() == r.len() && b.len() == m.len());

        for ((b, r), m) in b.iter().zip(r).zip(m)
        {
            if self.word(b, r, m, ctx) == Verdict::Injection
            {
                return Verdict::Injection;
            }
        }

        Verdict::Equivalent
    }

    fn word(&self, b: &Word, r: &Word, m: &Word, ctx: Ctx) -> Verdict
    {
        req!(glob_count(&flatten_literal(b)) == glob_count(&flatten_literal(r)));
        req!(glob_count(&flatten_literal(b)) == glob_count(&flatten_literal(m)));

        req!(b.parts.len() == r.parts.len() && b.parts.len() == m.parts.len());

        let allow_flags = self.allow_flags_at(&r.byte_range);

        for ((bp, rp), mp) in b.parts.iter().zip(&r.parts).zip(&m.parts)
        {
            if self.word_part(bp, rp, mp, ctx, allow_flags) == Verdict::Injection
            {
                return Verdict::Injection;
            }
        }

        Verdict::Equivalent
    }

    fn allow_flags_at(&self, range: &Range<usize>) -> bool
    {
        if range.start == 0 && range.end == 0
        {
            return false;
        }

        self.honest_spans
            .iter()
            .any(|s| s.marker == SiteMarker::AllowFlags && s.range.start <= range.start && range.end <= s.range.end)
    }

    fn word_part(&self, b: &WordPart, r: &WordPart, m: &WordPart, ctx: Ctx, allow_flags: bool) -> Verdict
    {
        match (b, r, m)
        {
            (WordPart::Literal(b), WordPart::Literal(r), WordPart::Literal(m))
            | (WordPart::SingleQuoted(b), WordPart::SingleQuoted(r), WordPart::SingleQuoted(m)) =>
            {
                payload_eq(ctx, b, r, m, allow_flags)
            },
            (WordPart::DoubleQuoted(b), WordPart::DoubleQuoted(r), WordPart::DoubleQuoted(m)) =>
            {
                req!(b.len() == r.len() && b.len() == m.len());

                for ((b, r), m) in b.iter().zip(r).zip(m)
                {
                    if self.word_part(b, r, m, ctx, allow_flags) == Verdict::Injection
                    {
                        return Verdict::Injection;
                    }
                }

                Verdict::Equivalent
            },
            (
                WordPart::VarExpansion { name: bn, modifier: bm },
                WordPart::VarExpansion { name: rn, modifier: rm },
                WordPart::VarExpansion { name: mn, modifier: mm },
            ) =>
            {
                req!(bn == rn && bn == mn);

                self.param_modifier(bm, rm, mm)
            },
            (
                WordPart::CommandSubst { body: bb, backquoted: bq },
                WordPart::CommandSubst { body: rb, backquoted: rq },
                WordPart::CommandSubst { body: mb, backquoted: mq },
            ) =>
            {
                req!(bq == rq && bq == mq);

                self.commands(bb, rb, mb)
            },
            (WordPart::ArithExpansion(_), WordPart::ArithExpansion(_), WordPart::ArithExpansion(_)) =>
            {
                Verdict::Equivalent
            },
            (
                WordPart::ProcessSubst { direction: bd, body: bb },
                WordPart::ProcessSubst { direction: rd, body: rb },
                WordPart::ProcessSubst { direction: md, body: mb },
            ) =>
            {
                req!(bd == rd && bd == md);

                self.commands(bb, rb, mb)
            },
            (WordPart::BraceExpansion(b), WordPart::BraceExpansion(r), WordPart::BraceExpansion(m)) =>
            {
                self.words(b, r, m, ctx)
            },
            (WordPart::Glob(b), WordPart::Glob(r), WordPart::Glob(m)) => payload_eq(ctx, b, r, m, allow_flags),
            _ => Verdict::Injection,
        }
    }

    fn param_modifier(
        &self,
        b: &Option<ParamModifier>,
        r: &Option<ParamModifier>,
        m: &Option<ParamModifier>,
    ) -> Verdict
    {
        match (b, r, m)
        {
            (None, None, None) => Verdict::Equivalent,
            (Some(b), Some(r), Some(m)) => self.modifier(b, r, m),
            _ => Verdict::Injection,
        }
    }

    fn modifier(&self, b: &ParamModifier, r: &ParamModifier, m: &ParamModifier) -> Verdict
    {
        use ParamModifier::*;

        match (b, r, m)
        {
            (Length, Length, Length) | (Names, Names, Names) => Verdict::Equivalent,
            (
                DefaultIfUnset { word: b, colon: bc },
                DefaultIfUnset { word: r, colon: rc },
                DefaultIfUnset { word: m, colon: mc },
            )
            | (
                AssignIfUnset { word: b, colon: bc },
                AssignIfUnset { word: r, colon: rc },
                AssignIfUnset { word: m, colon: mc },
            )
            | (
                ErrorIfUnset { word: b, colon: bc },
                ErrorIfUnset { word: r, colon: rc },
                ErrorIfUnset { word: m, colon: mc },
            )
            | (
                AlternateIfSet { word: b, colon: bc },
                AlternateIfSet { word: r, colon: rc },
                AlternateIfSet { word: m, colon: mc },
            ) =>
            {
                req!(bc == rc && bc == mc);

                self.word(b, r, m, Ctx::JustStructure)
            },
            (RemoveSmallestSuffix(b), RemoveSmallestSuffix(r), RemoveSmallestSuffix(m))
            | (RemoveLargestSuffix(b), RemoveLargestSuffix(r), RemoveLargestSuffix(m))
            | (RemoveSmallestPrefix(b), RemoveSmallestPrefix(r), RemoveSmallestPrefix(m))
            | (RemoveLargestPrefix(b), RemoveLargestPrefix(r), RemoveLargestPrefix(m)) =>
            {
                self.word(b, r, m, Ctx::JustStructure)
            },
            (
                Replace { pattern: bp, replacement: brp, all: ba },
                Replace { pattern: rp, replacement: rrp, all: ra },
                Replace { pattern: mp, replacement: mrp, all: ma },
            ) =>
            {
                req!(ba == ra && ba == ma);

                or_reject(
                    self.word(bp, rp, mp, Ctx::JustStructure),
                    self.word(brp, rrp, mrp, Ctx::JustStructure),
                )
            },
            (
                CaseModify { pattern: bp, upper: bu, all: ba },
                CaseModify { pattern: rp, upper: ru, all: ra },
                CaseModify { pattern: mp, upper: mu, all: ma },
            ) =>
            {
                req!(bu == ru && bu == mu);
                req!(ba == ra && ba == ma);

                self.word(bp, rp, mp, Ctx::JustStructure)
            },
            (Slice { length: bl, .. }, Slice { length: rl, .. }, Slice { length: ml, .. }) =>
            {
                req!(bl.is_some() == rl.is_some() && bl.is_some() == ml.is_some());

                Verdict::Equivalent
            },
            (Index(_), Index(_), Index(_)) => Verdict::Equivalent,
            _ => Verdict::Injection,
        }
    }
}

fn or_reject(a: Verdict, b: Verdict) -> Verdict
{
    if a == Verdict::Injection || b == Verdict::Injection
    {
        Verdict::Injection
    }
    else
    {
        Verdict::Equivalent
    }
}

fn payload_eq(ctx: Ctx, b: &str, r: &str, m: &str, allow_flags: bool) -> Verdict
{
    match ctx
    {
        Ctx::MatchExactly =>
        {
            if b == r && b == m
            {
                Verdict::Equivalent
            }
            else
            {
                Verdict::Injection
            }
        },
        Ctx::ForbidFlagInjection =>
        {
            if allow_flags
            {
                return Verdict::Equivalent;
            }

            if !b.starts_with('-') && (r.starts_with('-') || m.starts_with('-'))
            {
                Verdict::Injection
            }
            else
            {
                Verdict::Equivalent
            }
        },
        Ctx::JustStructure => Verdict::Equivalent,
    }
}

/// Recursively flattens the literal text contributed by a word, for the
/// glob-metacharacter-count check that applies "regardless of context"
/// (spec.md 4.3).
fn flatten_literal(word: &Word) -> String
{
    fn part(p: &WordPart, out: &mut String)
    {
        match p
        {
            WordPart::Literal(s) | WordPart::SingleQuoted(s) | WordPart::Glob(s) => out.push_str(s),
            WordPart::DoubleQuoted(parts) =>
            {
                for p in parts
                {
                    part(p, out);
                }
            },
            _ => {},
        }
    }

    let mut out = String::new();

    for p in &word.parts
    {
        part(p, &mut out);
    }

    out
}

fn glob_count(s: &str) -> [usize; 5]
{
    let mut counts = [0usize; 5];

    for c in s.chars()
    {
        match c
        {
            '?' => counts[0] += 1,
            '*' => counts[1] += 1,
            '+' => counts[2] += 1,
            '@' => counts[3] += 1,
            '!' => counts[4] += 1,
            _ => {},
        }
    }

    counts
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::sh::lower::parse_program;

    fn judge_sources(b: &str, r: &str, m: &str) -> Verdict
    {
        let b = parse_program(b).expect("baseline parses");
        let r = parse_program(r).expect("requested parses");
        let m = parse_program(m).expect("mutated parses");

        judge(&b, &r, &m, &[])
    }

    #[test]
    fn plain_argument_substitution_is_equivalent()
    {
        let v = judge_sources("echo PLACEHOLDER", "echo hello", "echo hheelllloo");

        assert_eq!(v, Verdict::Equivalent);
    }

    #[test]
    fn leading_dash_argument_is_rejected()
    {
        let v = judge_sources("echo PLACEHOLDER", "echo --rm", "echo --rrmm");

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn allow_flags_exempts_dash_argument()
    {
        let spans = vec![Span {
            range:  5..8,
            marker: SiteMarker::AllowFlags,
        }];
        let b = parse_program("echo PLACEHOLDER").unwrap();
        let r = parse_program("echo -rm").unwrap();
        let m = parse_program("echo -rrmm").unwrap();

        assert_eq!(judge(&b, &r, &m, &spans), Verdict::Equivalent);
    }

    #[test]
    fn extra_pipeline_stage_is_injection()
    {
        let v = judge_sources("echo PLACEHOLDER", "echo hi | rm -rf /", "echo hhii");

        assert_eq!(v, Verdict::Injection);
    }

    #[test]
    fn command_name_must_match_exactly()
    {
        let v = judge_sources("echo PLACEHOLDER", "rm PLACEHOLDER", "rm PPLLAACCEEHHOOLLDDEERR");

        assert_eq!(v, Verdict::Injection);
    }
}
