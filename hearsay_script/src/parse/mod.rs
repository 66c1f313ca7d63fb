//! Backtracking parser combinators with indentation tracking.
//!
//! A parser is anything implementing [`Parser`]: it takes a [`ParseState`] by value
//! plus a mutable context, and returns the parsed value with the advanced state.
//! Because the state is `Copy`, a failed attempt never disturbs the caller's copy.
//! The context is rolled back through the [`Journal`] trait whenever a combinator
//! catches a failure, so speculative parses leave no facts behind.
//!
//! Failures come in two kinds. [`ParseError::Expected`] is an ordinary mismatch and
//! is caught by `or`, `many`, `until`, `maybe` and friends. [`ParseError::Reason`] is
//! a semantic error (a duplicate name, an unknown binding) and passes through every
//! combinator untouched.

use std::fmt;

use thiserror::Error;

mod chars;
mod combinators;
mod indent;
mod transaction;

pub use chars::*;
pub use combinators::*;
pub use indent::*;
pub use transaction::Transaction;

/// Cursor over the source text.
///
/// `indent_index` is the offset whose column is the reference for indentation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseState<'s> {
    source: &'s str,
    index: usize,
    indent_index: usize,
    tab_size: usize,
}

impl<'s> ParseState<'s> {
    pub fn new(source: &'s str, tab_size: usize) -> Self {
        Self {
            source,
            index: 0,
            indent_index: 0,
            tab_size: tab_size.max(1),
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn indent_index(&self) -> usize {
        self.indent_index
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'s str {
        &self.source[self.index..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.source.len()
    }

    /// True at offset 0 and directly after a line break.
    pub fn at_line_start(&self) -> bool {
        self.index == 0 || matches!(self.source.as_bytes()[self.index - 1], b'\n' | b'\r')
    }

    /// Move forward `bytes` bytes, clamped to the end of input.
    #[must_use]
    pub fn advance(self, bytes: usize) -> Self {
        Self {
            index: (self.index + bytes).min(self.source.len()),
            ..self
        }
    }

    #[must_use]
    pub fn with_indent_index(self, indent_index: usize) -> Self {
        Self { indent_index, ..self }
    }

    /// Make the current offset the indentation reference.
    #[must_use]
    pub fn indent_here(self) -> Self {
        self.with_indent_index(self.index)
    }

    /// Column of the current line's first non-blank character.
    pub fn column(&self) -> usize {
        self.column_at(self.index)
    }

    /// Column the indentation checks compare against.
    pub fn indent_column(&self) -> usize {
        self.column_at(self.indent_index)
    }

    /// Indentation column of the line containing `index`: leading spaces count one,
    /// tabs jump to the next tab stop. Columns start at 1.
    pub fn column_at(&self, index: usize) -> usize {
        let index = index.min(self.source.len());
        let line_start = self.source[..index].rfind(['\n', '\r']).map_or(0, |i| i + 1);
        let mut column = 1;
        for ch in self.source[line_start..].chars() {
            match ch {
                ' ' => column += 1,
                '\t' => column += self.tab_size - column % self.tab_size,
                _ => break,
            }
        }
        column
    }
}

/// A mismatch: where parsing stopped and what would have been accepted there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub index: usize,
    pub expected: Vec<String>,
}

impl ParseFailure {
    pub fn new(index: usize, expected: impl Into<String>) -> Self {
        Self {
            index,
            expected: vec![expected.into()],
        }
    }

    /// Merge two expected-sets at `index`, dropping duplicates.
    pub fn merge(index: usize, first: ParseFailure, second: ParseFailure) -> Self {
        let mut expected = first.expected;
        for item in second.expected {
            if !expected.contains(&item) {
                expected.push(item);
            }
        }
        Self { index, expected }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} at offset {}", self.expected.join(" or "), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{0}")]
    Expected(ParseFailure),
    #[error("{reason} (at offset {index})")]
    Reason { index: usize, reason: String },
}

impl ParseError {
    pub fn expected(index: usize, what: impl Into<String>) -> Self {
        ParseError::Expected(ParseFailure::new(index, what))
    }

    pub fn reason(index: usize, reason: impl Into<String>) -> Self {
        ParseError::Reason {
            index,
            reason: reason.into(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ParseError::Expected(failure) => failure.index,
            ParseError::Reason { index, .. } => *index,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::Reason { .. })
    }
}

pub type PResult<'s, T> = Result<(T, ParseState<'s>), ParseError>;

/// Context that can be rewound when a parse attempt is abandoned.
pub trait Journal {
    type Mark: Copy;

    fn mark(&self) -> Self::Mark;
    fn rewind(&mut self, mark: Self::Mark);
}

impl Journal for () {
    type Mark = ();

    fn mark(&self) {}
    fn rewind(&mut self, _mark: ()) {}
}

/// A parsing rule over source borrowed for `'s`, with mutable context `C`.
pub trait Parser<'s, C> {
    type Output;

    /// # Errors
    /// Returns the failure that stopped this rule.
    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Self::Output>;

    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U,
    {
        Map { parser: self, f }
    }

    /// Replace the result with a fixed value.
    fn to<U: Clone>(self, value: U) -> To<Self, U>
    where
        Self: Sized,
    {
        To { parser: self, value }
    }

    /// Run `next` after this parser, keeping only `next`'s result.
    fn then<Q>(self, next: Q) -> Then<Self, Q>
    where
        Self: Sized,
        Q: Parser<'s, C>,
    {
        Then { first: self, second: next }
    }

    /// Run `next` after this parser, keeping only this parser's result.
    fn skip<Q>(self, next: Q) -> Skip<Self, Q>
    where
        Self: Sized,
        Q: Parser<'s, C>,
    {
        Skip { first: self, second: next }
    }

    fn or<Q>(self, other: Q) -> Or<Self, Q>
    where
        Self: Sized,
        Q: Parser<'s, C, Output = Self::Output>,
    {
        Or { first: self, second: other }
    }

    fn many(self, minimum: usize) -> Many<Self>
    where
        Self: Sized,
    {
        Many { parser: self, minimum }
    }

    fn many1(self) -> Many<Self>
    where
        Self: Sized,
    {
        self.many(1)
    }

    fn until<S>(self, stop: S) -> Until<Self, S>
    where
        Self: Sized,
        S: Parser<'s, C>,
    {
        Until { parser: self, stop }
    }

    fn maybe(self) -> Maybe<Self>
    where
        Self: Sized,
    {
        Maybe { parser: self }
    }

    /// Reject results failing `predicate`, reporting `expected` at the start position.
    fn verify<F>(self, predicate: F, expected: impl Into<String>) -> Verify<Self, F>
    where
        Self: Sized,
        F: Fn(&Self::Output) -> bool,
    {
        Verify {
            parser: self,
            predicate,
            expected: expected.into(),
        }
    }

    /// Left-associative fold of `self (op self)*`.
    fn chain_l1<O>(self, op: O) -> ChainL1<Self, O>
    where
        Self: Sized,
        O: Parser<'s, C>,
        O::Output: Fn(Self::Output, Self::Output) -> Self::Output,
    {
        ChainL1 { operand: self, op }
    }

    fn boxed(self) -> Box<dyn Parser<'s, C, Output = Self::Output> + 's>
    where
        Self: Sized + 's,
    {
        Box::new(self)
    }
}

impl<'s, C, T, F> Parser<'s, C> for F
where
    F: Fn(ParseState<'s>, &mut C) -> PResult<'s, T>,
{
    type Output = T;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, T> {
        self(state, ctx)
    }
}

/// Pins a closure to the parser signature so its argument types are inferred.
pub fn parser<'s, C, T, F>(f: F) -> F
where
    F: Fn(ParseState<'s>, &mut C) -> PResult<'s, T>,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_count_leading_blanks_only() {
        let state = ParseState::new("abc\n   def\n\tghi", 4);
        assert_eq!(state.column_at(0), 1);
        assert_eq!(state.column_at(2), 1);
        assert_eq!(state.column_at(7), 4);
        assert_eq!(state.column_at(9), 4);
        assert_eq!(state.column_at(12), 4);
    }

    #[test]
    fn tabs_round_up_to_tab_stops() {
        let state = ParseState::new("  \t\tx", 4);
        assert_eq!(state.column_at(4), 8);
        let narrow = ParseState::new("\tx", 2);
        assert_eq!(narrow.column_at(1), 2);
    }

    #[test]
    fn advance_leaves_original_untouched() {
        let state = ParseState::new("hello", 4);
        let next = state.advance(2);
        assert_eq!(state.index(), 0);
        assert_eq!(next.rest(), "llo");
        assert!(next.advance(10).is_eof());
    }

    #[test]
    fn line_start_detection() {
        let state = ParseState::new("a\r\nb", 4);
        assert!(state.at_line_start());
        assert!(!state.advance(1).at_line_start());
        assert!(state.advance(3).at_line_start());
    }
}
