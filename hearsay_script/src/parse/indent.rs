//! Indentation checks and line-oriented blocks.
//!
//! Each check compares the column of the current line against the column of the
//! state's indentation reference and consumes nothing.

use super::combinators::owed;
use super::{Journal, PResult, ParseError, ParseState, Parser, eol, newline, parser, spaces};

fn indentation<'s, C>(
    accept: fn(usize, usize) -> bool,
    describe: fn(usize) -> String,
) -> impl Parser<'s, C, Output = usize> {
    parser(move |state: ParseState<'s>, _ctx: &mut C| {
        let (column, reference) = (state.column(), state.indent_column());
        if accept(column, reference) {
            Ok((column, state))
        } else {
            Err(ParseError::expected(state.index(), describe(reference)))
        }
    })
}

pub fn same<'s, C>() -> impl Parser<'s, C, Output = usize> {
    indentation(|column, reference| column == reference, |reference| {
        format!("line indented to column {reference}")
    })
}

pub fn same_or_indented<'s, C>() -> impl Parser<'s, C, Output = usize> {
    indentation(|column, reference| column >= reference, |reference| {
        format!("line indented to column {reference} or more")
    })
}

pub fn indented<'s, C>() -> impl Parser<'s, C, Output = usize> {
    indentation(|column, reference| column > reference, |reference| {
        format!("line indented past column {reference}")
    })
}

/// Same test as [`same`], for use where a dedent back to this level is expected.
pub fn unindented<'s, C>() -> impl Parser<'s, C, Output = usize> {
    indentation(|column, reference| column == reference, |reference| {
        format!("line unindented to column {reference}")
    })
}

/// Finish the current line: trailing blanks and the line break, then any blank lines.
///
/// Succeeds without consuming anything when already at the start of a line, which is
/// where multi-line constructs leave the cursor.
pub fn line_end<'s, C>() -> impl Parser<'s, C, Output = ()> {
    parser(|state: ParseState<'s>, ctx: &mut C| {
        let mut state = state;
        if !state.at_line_start() {
            let (_, next) = spaces().parse(state, ctx)?;
            let (_, next) = eol().parse(next, ctx)?;
            state = next;
        }
        loop {
            let (_, blank) = spaces().parse(state, ctx)?;
            if blank.is_eof() {
                return Ok(((), blank));
            }
            match newline().parse(blank, ctx) {
                Ok((_, next)) => state = next,
                Err(_) => return Ok(((), state)),
            }
        }
    })
}

/// Lines of `item`, each followed by [`line_end`]. Before every further item the
/// next line must pass `continuation`; the first line that does not is left for the
/// enclosing rule. Fewer than `minimum` items is a failure.
pub struct Block<P, I> {
    item: P,
    continuation: I,
    minimum: usize,
}

pub fn block<P, I>(item: P, continuation: I, minimum: usize) -> Block<P, I> {
    Block {
        item,
        continuation,
        minimum,
    }
}

impl<'s, C, P, I> Parser<'s, C> for Block<P, I>
where
    C: Journal,
    P: Parser<'s, C>,
    I: Parser<'s, C>,
{
    type Output = Vec<P::Output>;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Vec<P::Output>> {
        let mut results = Vec::new();
        let mut state = state;
        loop {
            let (value, next) = self.item.parse(state, ctx)?;
            results.push(value);
            let (_, next) = line_end().parse(next, ctx)?;
            state = next;
            if state.is_eof() {
                return Ok((results, state));
            }
            let mark = ctx.mark();
            let (_, indented) = spaces().parse(state, ctx)?;
            match self.continuation.parse(indented, ctx) {
                Ok(_) => state = indented,
                Err(ParseError::Expected(failure)) => {
                    ctx.rewind(mark);
                    if results.len() < self.minimum {
                        return Err(owed(failure, self.minimum - results.len()));
                    }
                    return Ok((results, state));
                },
                Err(fatal) => return Err(fatal),
            }
        }
    }
}
