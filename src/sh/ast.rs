/*
 * This Source Code Form is subject to the terms of the
 * Mozilla Public License, v. 2.0. If a copy of the MPL
 * was not distributed with this file, You can obtain one at http://mozilla.org/MPL/2.0/.
 */

//! The shell syntax tree the equivalence judge (`crate::sh::judge`)
//! compares, spec section 4.3: "command lists, pipelines, if/while/for/
//! case/select, C-style loops, test clauses, arithmetic commands/
//! expressions, declaration clauses, function declarations, coprocesses,
//! time clauses, redirections (including heredocs), assignments, array
//! expressions, word iterators, brace expansions, process substitutions,
//! extended globs, command substitutions, parameter expansions ...".
//!
//! This tree is produced from a `tree-sitter-bash` CST by
//! [`crate::sh::lower`]; nothing here is parsed directly from source
//! text.

#[derive(Debug, Clone)]
pub(crate) struct Word
{
    pub parts: Vec<WordPart>,
    /// Byte range of this word in the rendering it was parsed from.
    /// Used only by the judge's `AllowFlags` lookup (`crate::sh::judge`),
    /// which needs to know whether a site the expansion driver marked
    /// still lands on this exact word after parsing; `0..0` marks a word
    /// synthesized during lowering with no source position of its own.
    pub byte_range: std::ops::Range<usize>,
}

#[derive(Debug, Clone)]
pub(crate) enum WordPart
{
    Literal(String),
    SingleQuoted(String),
    DoubleQuoted(Vec<WordPart>),
    VarExpansion
    {
        name:     String,
        modifier: Option<ParamModifier>,
    },
    CommandSubst
    {
        body:       Vec<Command>,
        backquoted: bool,
    },
    ArithExpansion(String),
    ProcessSubst
    {
        direction: ProcessSubstDirection,
        body:      Vec<Command>,
    },
    BraceExpansion(Vec<Word>),
    /// An unquoted, unexpanded glob fragment (`*`, `?`, `[...]`, or an
    /// extglob form like `@(a|b)`). Kept distinct from `Literal` so the
    /// judge's glob-metacharacter-count rule (spec.md 4.3) can be
    /// applied only where a glob could actually fire.
    Glob(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessSubstDirection
{
    In,
    Out,
}

/// `${name<modifier>}` forms, spec.md 4.3: "parameter expansions (all
/// modifiers: short/long, length `#`, width, index, slice, replace,
/// case, names)".
#[derive(Debug, Clone)]
pub(crate) enum ParamModifier
{
    Length,
    DefaultIfUnset
    {
        word:  Box<Word>,
        colon: bool,
    },
    AssignIfUnset
    {
        word:  Box<Word>,
        colon: bool,
    },
    ErrorIfUnset
    {
        word:  Box<Word>,
        colon: bool,
    },
    AlternateIfSet
    {
        word:  Box<Word>,
        colon: bool,
    },
    RemoveSmallestSuffix(Box<Word>),
    RemoveLargestSuffix(Box<Word>),
    RemoveSmallestPrefix(Box<Word>),
    RemoveLargestPrefix(Box<Word>),
    Replace
    {
        pattern:     Box<Word>,
        replacement: Box<Word>,
        all:         bool,
    },
    CaseModify
    {
        pattern: Box<Word>,
        upper:   bool,
        all:     bool,
    },
    Slice
    {
        offset: String,
        length: Option<String>,
    },
    Index(String),
    /// `${!prefix*}` / `${!prefix@}`.
    Names,
}

#[derive(Debug, Clone)]
pub(crate) struct Redirect
{
    pub fd:           Option<u32>,
    pub kind:         RedirectKind,
    pub target:       Word,
    /// Only present on `RedirectKind::Heredoc`: the literal body text,
    /// compared with `matchExactly` (spec.md 4.3).
    pub heredoc_body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RedirectKind
{
    In,
    Out,
    Append,
    InOut,
    DupIn,
    DupOut,
    Clobber,
    HereString,
    Heredoc
    {
        strip_tabs: bool,
        quoted:     bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct SimpleCommand
{
    pub assignments: Vec<Assignment>,
    pub name:        Option<Word>,
    pub args:        Vec<Word>,
    pub redirects:   Vec<Redirect>,
}

#[derive(Debug, Clone)]
pub(crate) struct Assignment
{
    pub name:  String,
    pub index: Option<Word>,
    pub op:    AssignOp,
    pub value: Option<AssignValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignOp
{
    Set,
    Append,
}

#[derive(Debug, Clone)]
pub(crate) enum AssignValue
{
    Scalar(Word),
    Array(Vec<Word>),
}

#[derive(Debug, Clone)]
pub(crate) struct CaseArm
{
    pub patterns: Vec<Word>,
    pub body:     Vec<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListOp
{
    And,
    Or,
    Seq,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeKind
{
    Posix,
    Bash,
}

/// `test`/`[[ ]]` conditionals, spec.md 4.3's "test clauses".
#[derive(Debug, Clone)]
pub(crate) enum TestExpr
{
    Unary
    {
        op:      String,
        operand: Word,
    },
    Binary
    {
        op:  String,
        lhs: Word,
        rhs: Word,
    },
    And(Box<TestExpr>, Box<TestExpr>),
    Or(Box<TestExpr>, Box<TestExpr>),
    Not(Box<TestExpr>),
    Group(Box<TestExpr>),
    Word(Word),
}

#[derive(Debug, Clone)]
pub(crate) enum Command
{
    Simple(SimpleCommand),
    Pipeline
    {
        stages:   Vec<Command>,
        negated:  bool,
        time:     Option<TimeKind>,
    },
    List
    {
        left:  Box<Command>,
        op:    ListOp,
        right: Box<Command>,
    },
    If
    {
        branches:  Vec<(Vec<Command>, Vec<Command>)>,
        else_body: Option<Vec<Command>>,
    },
    While
    {
        cond:  Vec<Command>,
        body:  Vec<Command>,
        until: bool,
    },
    For
    {
        var:   String,
        words: Vec<Word>,
        body:  Vec<Command>,
    },
    CStyleFor
    {
        init:   Option<String>,
        cond:   Option<String>,
        update: Option<String>,
        body:   Vec<Command>,
    },
    Select
    {
        var:   String,
        words: Vec<Word>,
        body:  Vec<Command>,
    },
    Case
    {
        word: Word,
        arms: Vec<CaseArm>,
    },
    FunctionDef
    {
        name: String,
        body: Box<Command>,
    },
    Subshell(Vec<Command>),
    Group(Vec<Command>),
    Test(TestExpr),
    Arithmetic(String),
    Declaration
    {
        keyword:     String,
        assignments: Vec<Assignment>,
    },
    Coproc
    {
        name: Option<String>,
        body: Box<Command>,
    },
}
