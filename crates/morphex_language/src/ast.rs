//! The syntax tree produced by the pattern parser.
//!
//! Nodes keep their source tokens so the semantic checker can point
//! diagnostics at the exact names that caused them. Nothing here is
//! resolved: element names, pattern references and attribute names are
//! plain identifiers until `morphex-engine` checks them against a
//! configuration.

use crate::token::Token;

/// `Name` or `Name.Sub` — an element, a reference, or either with an
/// attribute name attached.
#[derive(Debug, Clone)]
pub struct ExtendedName {
    pub name: Token,
    pub sub: Option<Token>,
}

/// One `<attr=value|value>` or `<attr!=value>` restriction on an element.
#[derive(Debug, Clone)]
pub struct ElementCondition {
    pub name: Token,
    pub exclude: bool,
    pub values: Vec<Token>,
}

/// A condition written after an alternative inside `<< … >>`.
#[derive(Debug, Clone)]
pub enum AlternativeCondition {
    /// `a.c == b.c` chains, or the single-attribute form `num==` meaning
    /// "all words of the alternative agree on num".
    Agreement { names: Vec<ExtendedName>, strong: bool },
    /// `Dict(a b, c)` — groups of extended names forming candidate phrases.
    Dictionary {
        name: Token,
        groups: Vec<Vec<ExtendedName>>,
    },
}

/// One alternative: a node plus its trailing conditions.
#[derive(Debug)]
pub struct Alternative {
    pub node: PatternNode,
    pub conditions: Vec<AlternativeCondition>,
}

/// A pattern body node.
#[derive(Debug)]
pub enum PatternNode {
    /// `"…"` — matches any word whose surface form satisfies the regex.
    Regexp(Token),
    /// `N2<case=nom>` — a word-class element or a pattern reference,
    /// with optional restrictions.
    Element {
        name: Token,
        conditions: Vec<ElementCondition>,
    },
    /// Juxtaposition: `A N V`.
    Sequence(Vec<PatternNode>),
    /// `x ~ y ~ z` — a sequence whose parts may swap.
    Transposition(Vec<PatternNode>),
    /// `( a | b )`.
    Alternatives(Vec<Alternative>),
    /// `{ … }<min,max>` and `[ … ]` (which is `<0,1>`).
    Repeating {
        node: Box<PatternNode>,
        min_count: usize,
        max_count: usize,
    },
}

/// A full parsed definition: `Name(args) = alternatives`.
#[derive(Debug)]
pub struct PatternDef {
    pub name: Token,
    pub arguments: Vec<ExtendedName>,
    pub alternatives: Vec<Alternative>,
}
