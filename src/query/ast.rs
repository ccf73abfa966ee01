//! Query tree shapes
//!
//! [`ParsedGroup`] is the shape the parser hands over: subqueries grouped
//! by sign, with parenthesised groups nesting the same shape. Translation
//! resolves every term to a wordId and yields [`TranslatedGroup`], the
//! form the evaluator consumes.

/// Sign of a query group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    /// `+`: every subquery must match
    Must,
    /// unsigned: optional, score-contributing
    Optional,
    /// `-`: matching documents are excluded
    Not,
}

/// One subquery as produced by the parser
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedSub {
    /// A term or phrase match, optionally field-qualified
    Match {
        field: Option<String>,
        value: String,
    },
    /// A parenthesised group with its own signed entries
    Paren(Vec<ParsedGroup>),
}

/// A signed group of subqueries
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedGroup {
    pub sign: Sign,
    pub subs: Vec<ParsedSub>,
}

/// Subquery after wordId resolution
#[derive(Clone, Debug, PartialEq)]
pub enum TranslatedSub {
    /// No surviving term (unknown or dropped words only)
    NoInfo,
    /// A single stopword
    Stopword,
    /// A single known word
    Term(u32),
    /// An exact phrase: ids in order, `-1` for stopwords, `0` for unknowns
    Phrase(Vec<i32>),
    /// A translated parenthesised group
    Paren(Vec<TranslatedGroup>),
}

/// A signed group of translated subqueries
#[derive(Clone, Debug, PartialEq)]
pub struct TranslatedGroup {
    pub sign: Sign,
    pub subs: Vec<TranslatedSub>,
}
