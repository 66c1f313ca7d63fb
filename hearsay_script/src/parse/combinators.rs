use std::cell::OnceCell;

use super::{Journal, PResult, ParseError, ParseFailure, ParseState, Parser};

/// Succeeds with a clone of `value` without consuming input.
pub struct Pure<T>(T);

pub fn pure<T: Clone>(value: T) -> Pure<T> {
    Pure(value)
}

impl<'s, C, T: Clone> Parser<'s, C> for Pure<T> {
    type Output = T;

    fn parse(&self, state: ParseState<'s>, _ctx: &mut C) -> PResult<'s, T> {
        Ok((self.0.clone(), state))
    }
}

pub struct Map<P, F> {
    pub(super) parser: P,
    pub(super) f: F,
}

impl<'s, C, P, F, U> Parser<'s, C> for Map<P, F>
where
    P: Parser<'s, C>,
    F: Fn(P::Output) -> U,
{
    type Output = U;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, U> {
        let (value, state) = self.parser.parse(state, ctx)?;
        Ok(((self.f)(value), state))
    }
}

pub struct To<P, U> {
    pub(super) parser: P,
    pub(super) value: U,
}

impl<'s, C, P, U> Parser<'s, C> for To<P, U>
where
    P: Parser<'s, C>,
    U: Clone,
{
    type Output = U;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, U> {
        let (_, state) = self.parser.parse(state, ctx)?;
        Ok((self.value.clone(), state))
    }
}

pub struct Then<P, Q> {
    pub(super) first: P,
    pub(super) second: Q,
}

impl<'s, C, P, Q> Parser<'s, C> for Then<P, Q>
where
    P: Parser<'s, C>,
    Q: Parser<'s, C>,
{
    type Output = Q::Output;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Q::Output> {
        let (_, state) = self.first.parse(state, ctx)?;
        self.second.parse(state, ctx)
    }
}

pub struct Skip<P, Q> {
    pub(super) first: P,
    pub(super) second: Q,
}

impl<'s, C, P, Q> Parser<'s, C> for Skip<P, Q>
where
    P: Parser<'s, C>,
    Q: Parser<'s, C>,
{
    type Output = P::Output;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, P::Output> {
        let (value, state) = self.first.parse(state, ctx)?;
        let (_, state) = self.second.parse(state, ctx)?;
        Ok((value, state))
    }
}

/// Tries `first`, then `second` from the same position. When both fail, the
/// failure is reported at the starting offset with both expected-sets merged.
pub struct Or<P, Q> {
    pub(super) first: P,
    pub(super) second: Q,
}

impl<'s, C, P, Q> Parser<'s, C> for Or<P, Q>
where
    C: Journal,
    P: Parser<'s, C>,
    Q: Parser<'s, C, Output = P::Output>,
{
    type Output = P::Output;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, P::Output> {
        let mark = ctx.mark();
        let first = match self.first.parse(state, ctx) {
            Err(ParseError::Expected(failure)) => failure,
            other => return other,
        };
        ctx.rewind(mark);
        let second = match self.second.parse(state, ctx) {
            Err(ParseError::Expected(failure)) => failure,
            other => return other,
        };
        ctx.rewind(mark);
        Err(ParseError::Expected(ParseFailure::merge(state.index(), first, second)))
    }
}

pub struct Many<P> {
    pub(super) parser: P,
    pub(super) minimum: usize,
}

impl<'s, C, P> Parser<'s, C> for Many<P>
where
    C: Journal,
    P: Parser<'s, C>,
{
    type Output = Vec<P::Output>;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Vec<P::Output>> {
        let mut results = Vec::new();
        let mut state = state;
        loop {
            let mark = ctx.mark();
            match self.parser.parse(state, ctx) {
                Ok((value, next)) => {
                    results.push(value);
                    // an item that consumes nothing would repeat forever
                    if next.index() == state.index() {
                        return Ok((results, next));
                    }
                    state = next;
                },
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

/// Annotate a repetition failure with how many items were still required.
pub(super) fn owed(failure: ParseFailure, remaining: usize) -> ParseError {
    ParseError::expected(
        failure.index,
        format!("at least {remaining} more of {}", failure.expected.join(" or ")),
    )
}

/// Repeats `parser` until `stop` would succeed. `stop` is only peeked.
pub struct Until<P, S> {
    pub(super) parser: P,
    pub(super) stop: S,
}

impl<'s, C, P, S> Parser<'s, C> for Until<P, S>
where
    C: Journal,
    P: Parser<'s, C>,
    S: Parser<'s, C>,
{
    type Output = Vec<P::Output>;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Vec<P::Output>> {
        let mut results = Vec::new();
        let mut state = state;
        loop {
            let mark = ctx.mark();
            let stop_failure = match self.stop.parse(state, ctx) {
                Ok(_) => {
                    ctx.rewind(mark);
                    return Ok((results, state));
                },
                Err(ParseError::Expected(failure)) => failure,
                Err(fatal) => return Err(fatal),
            };
            ctx.rewind(mark);
            match self.parser.parse(state, ctx) {
                Ok((value, next)) if next.index() > state.index() => {
                    results.push(value);
                    state = next;
                },
                Ok(_) => {
                    ctx.rewind(mark);
                    return Err(ParseError::Expected(stop_failure));
                },
                Err(ParseError::Expected(failure)) => {
                    ctx.rewind(mark);
                    let reported = if state.is_eof() { stop_failure } else { failure };
                    return Err(ParseError::Expected(reported));
                },
                Err(fatal) => return Err(fatal),
            }
        }
    }
}

pub struct Maybe<P> {
    pub(super) parser: P,
}

impl<'s, C, P> Parser<'s, C> for Maybe<P>
where
    C: Journal,
    P: Parser<'s, C>,
{
    type Output = Option<P::Output>;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, Option<P::Output>> {
        let mark = ctx.mark();
        match self.parser.parse(state, ctx) {
            Ok((value, next)) => Ok((Some(value), next)),
            Err(ParseError::Expected(_)) => {
                ctx.rewind(mark);
                Ok((None, state))
            },
            Err(fatal) => Err(fatal),
        }
    }
}

pub struct Verify<P, F> {
    pub(super) parser: P,
    pub(super) predicate: F,
    pub(super) expected: String,
}

impl<'s, C, P, F> Parser<'s, C> for Verify<P, F>
where
    C: Journal,
    P: Parser<'s, C>,
    F: Fn(&P::Output) -> bool,
{
    type Output = P::Output;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, P::Output> {
        let mark = ctx.mark();
        let (value, next) = self.parser.parse(state, ctx)?;
        if (self.predicate)(&value) {
            Ok((value, next))
        } else {
            ctx.rewind(mark);
            Err(ParseError::expected(state.index(), self.expected.clone()))
        }
    }
}

pub struct ChainL1<P, O> {
    pub(super) operand: P,
    pub(super) op: O,
}

impl<'s, C, P, O> Parser<'s, C> for ChainL1<P, O>
where
    C: Journal,
    P: Parser<'s, C>,
    O: Parser<'s, C>,
    O::Output: Fn(P::Output, P::Output) -> P::Output,
{
    type Output = P::Output;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, P::Output> {
        let (mut acc, mut state) = self.operand.parse(state, ctx)?;
        loop {
            let mark = ctx.mark();
            let step = match self.op.parse(state, ctx) {
                Ok((op, next)) => self.operand.parse(next, ctx).map(|(rhs, next)| (op, rhs, next)),
                Err(e) => Err(e),
            };
            match step {
                Ok((op, rhs, next)) => {
                    acc = op(acc, rhs);
                    state = next;
                },
                Err(ParseError::Expected(_)) => {
                    ctx.rewind(mark);
                    return Ok((acc, state));
                },
                Err(fatal) => return Err(fatal),
            }
        }
    }
}

/// Zero-width check that `parser` matches here.
pub struct FollowedBy<P> {
    parser: P,
}

pub fn followed_by<P>(parser: P) -> FollowedBy<P> {
    FollowedBy { parser }
}

impl<'s, C, P> Parser<'s, C> for FollowedBy<P>
where
    C: Journal,
    P: Parser<'s, C>,
{
    type Output = ();

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, ()> {
        let mark = ctx.mark();
        let result = self.parser.parse(state, ctx);
        ctx.rewind(mark);
        match result {
            Ok(_) => Ok(((), state)),
            Err(ParseError::Expected(failure)) => Err(ParseError::Expected(ParseFailure {
                index: state.index(),
                expected: failure.expected,
            })),
            Err(fatal) => Err(fatal),
        }
    }
}

/// Zero-width check that `parser` does not match here.
pub struct NotFollowedBy<P> {
    parser: P,
    expected: String,
}

pub fn not_followed_by<P>(parser: P, expected: impl Into<String>) -> NotFollowedBy<P> {
    NotFollowedBy {
        parser,
        expected: expected.into(),
    }
}

impl<'s, C, P> Parser<'s, C> for NotFollowedBy<P>
where
    C: Journal,
    P: Parser<'s, C>,
{
    type Output = ();

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, ()> {
        let mark = ctx.mark();
        let result = self.parser.parse(state, ctx);
        ctx.rewind(mark);
        match result {
            Ok(_) => Err(ParseError::expected(state.index(), self.expected.clone())),
            Err(ParseError::Expected(_)) => Ok(((), state)),
            Err(fatal) => Err(fatal),
        }
    }
}

type Boxed<'s, C, T> = Box<dyn Parser<'s, C, Output = T> + 's>;

/// A rule built on first use and kept for later calls. Lets a rule refer to one
/// that encloses it without building the enclosing rule eagerly.
pub struct Lazy<'s, C, T, F> {
    thunk: F,
    cell: OnceCell<Boxed<'s, C, T>>,
}

pub fn lazy<'s, C, T, F>(thunk: F) -> Lazy<'s, C, T, F>
where
    F: Fn() -> Boxed<'s, C, T>,
{
    Lazy {
        thunk,
        cell: OnceCell::new(),
    }
}

impl<'s, C, T, F> Parser<'s, C> for Lazy<'s, C, T, F>
where
    F: Fn() -> Boxed<'s, C, T>,
{
    type Output = T;

    fn parse(&self, state: ParseState<'s>, ctx: &mut C) -> PResult<'s, T> {
        self.cell.get_or_init(&self.thunk).parse(state, ctx)
    }
}
