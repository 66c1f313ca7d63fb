use super::{Journal, PResult, ParseError, ParseState, Parser, followed_by};

/// Scoped checkpoint for rules that parse in several steps.
///
/// The transaction owns a working copy of the state and borrows the context. Dropping
/// it rewinds the context to the last commit point; the caller's own state is never
/// touched, so an early `?` return leaves nothing behind. [`Transaction::commit`]
/// moves the commit point forward without ending the rule, and [`Transaction::finish`]
/// ends it, handing back the advanced state with the caller's indentation reference.
pub struct Transaction<'c, 's, C: Journal> {
    ctx: &'c mut C,
    state: ParseState<'s>,
    committed: ParseState<'s>,
    mark: C::Mark,
    indent_index: usize,
}

impl<'c, 's, C: Journal> Transaction<'c, 's, C> {
    pub fn begin(state: ParseState<'s>, ctx: &'c mut C) -> Self {
        let mark = ctx.mark();
        Self {
            ctx,
            state,
            committed: state,
            mark,
            indent_index: state.indent_index(),
        }
    }

    pub fn state(&self) -> ParseState<'s> {
        self.state
    }

    pub fn index(&self) -> usize {
        self.state.index()
    }

    pub fn ctx(&mut self) -> &mut C {
        self.ctx
    }

    /// Use the current offset as the indentation reference until the rule ends.
    pub fn indent_here(&mut self) {
        self.state = self.state.indent_here();
    }

    /// Run `parser` from the current position and advance past it.
    ///
    /// # Errors
    /// Propagates the parser's failure; the position is left where it was.
    pub fn run<P: Parser<'s, C>>(&mut self, parser: P) -> Result<P::Output, ParseError> {
        let (value, next) = parser.parse(self.state, self.ctx)?;
        self.state = next;
        Ok(value)
    }

    /// Like [`run`](Self::run), but a recoverable failure yields `None` and undoes
    /// whatever the attempt recorded.
    ///
    /// # Errors
    /// Fatal failures are still propagated.
    pub fn attempt<P: Parser<'s, C>>(&mut self, parser: P) -> Result<Option<P::Output>, ParseError> {
        let mark = self.ctx.mark();
        match parser.parse(self.state, self.ctx) {
            Ok((value, next)) => {
                self.state = next;
                Ok(Some(value))
            },
            Err(ParseError::Expected(_)) => {
                self.ctx.rewind(mark);
                Ok(None)
            },
            Err(fatal) => Err(fatal),
        }
    }

    /// True if `parser` would match here. Consumes nothing.
    ///
    /// # Errors
    /// Fatal failures are propagated.
    pub fn peek<P: Parser<'s, C>>(&mut self, parser: P) -> Result<bool, ParseError> {
        match followed_by(parser).parse(self.state, self.ctx) {
            Ok(_) => Ok(true),
            Err(ParseError::Expected(_)) => Ok(false),
            Err(fatal) => Err(fatal),
        }
    }

    /// Keep everything parsed so far, even if a later step is rolled back.
    pub fn commit(&mut self) {
        self.committed = self.state;
        self.mark = self.ctx.mark();
    }

    /// Return to the last commit point.
    pub fn rollback(&mut self) {
        self.state = self.committed;
        self.ctx.rewind(self.mark);
    }

    /// End the rule at the current position.
    ///
    /// # Errors
    /// Never fails; the `Result` lets rules end with `tx.finish(value)`.
    pub fn finish<T>(mut self, value: T) -> PResult<'s, T> {
        self.commit();
        Ok((value, self.state.with_indent_index(self.indent_index)))
    }

    /// End the rule at the last commit point, dropping anything parsed after it.
    ///
    /// # Errors
    /// Never fails; the `Result` lets rules end with `tx.settle(value)`.
    pub fn settle<T>(mut self, value: T) -> PResult<'s, T> {
        self.rollback();
        self.finish(value)
    }
}

impl<C: Journal> Drop for Transaction<'_, '_, C> {
    fn drop(&mut self) {
        self.ctx.rewind(self.mark);
    }
}
