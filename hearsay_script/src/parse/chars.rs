//! Character-level primitives.

use super::{ParseError, ParseFailure, ParseState, Parser, parser};

/// Blank characters inside a line.
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn satisfy<'s, C, F>(predicate: F, expected: impl Into<String>) -> impl Parser<'s, C, Output = char>
where
    F: Fn(char) -> bool,
{
    let expected = expected.into();
    parser(move |state: ParseState<'s>, _ctx: &mut C| match state.peek() {
        Some(ch) if predicate(ch) => Ok((ch, state.advance(ch.len_utf8()))),
        _ => Err(ParseError::expected(state.index(), expected.clone())),
    })
}

pub fn character<'s, C>(c: char) -> impl Parser<'s, C, Output = char> {
    satisfy(move |x| x == c, c.to_string())
}

pub fn any_char<'s, C>() -> impl Parser<'s, C, Output = char> {
    satisfy(|_| true, "any character")
}

pub fn alphanumeric<'s, C>() -> impl Parser<'s, C, Output = char> {
    satisfy(char::is_alphanumeric, "letter or digit")
}

pub fn space<'s, C>() -> impl Parser<'s, C, Output = char> {
    satisfy(is_blank, "space")
}

/// Longest run of characters matching `predicate`; may be empty.
pub fn take_while<'s, C, F>(predicate: F) -> impl Parser<'s, C, Output = &'s str>
where
    F: Fn(char) -> bool,
{
    parser(move |state: ParseState<'s>, _ctx: &mut C| {
        let rest = state.rest();
        let len = rest.find(|c: char| !predicate(c)).unwrap_or(rest.len());
        Ok((&rest[..len], state.advance(len)))
    })
}

/// Like [`take_while`] but requires at least one character.
pub fn take_while1<'s, C, F>(predicate: F, expected: impl Into<String>) -> impl Parser<'s, C, Output = &'s str>
where
    F: Fn(char) -> bool,
{
    let expected = expected.into();
    let run = take_while(predicate);
    parser(move |state: ParseState<'s>, ctx: &mut C| {
        let (text, next) = run.parse(state, ctx)?;
        if text.is_empty() {
            return Err(ParseError::expected(state.index(), expected.clone()));
        }
        Ok((text, next))
    })
}

pub fn spaces<'s, C>() -> impl Parser<'s, C, Output = &'s str> {
    take_while(is_blank)
}

pub fn spaces1<'s, C>() -> impl Parser<'s, C, Output = &'s str> {
    take_while1(is_blank, "space")
}

/// Any whitespace, line breaks included.
pub fn whitespaces<'s, C>() -> impl Parser<'s, C, Output = &'s str> {
    take_while(char::is_whitespace)
}

/// `\r\n`, `\n` or `\r`.
pub fn newline<'s, C>() -> impl Parser<'s, C, Output = ()> {
    parser(|state: ParseState<'s>, _ctx: &mut C| {
        let rest = state.rest();
        if rest.starts_with("\r\n") {
            Ok(((), state.advance(2)))
        } else if rest.starts_with(['\n', '\r']) {
            Ok(((), state.advance(1)))
        } else {
            Err(ParseError::expected(state.index(), "line break"))
        }
    })
}

pub fn eof<'s, C>() -> impl Parser<'s, C, Output = ()> {
    parser(|state: ParseState<'s>, _ctx: &mut C| {
        if state.is_eof() {
            Ok(((), state))
        } else {
            Err(ParseError::expected(state.index(), "end of input"))
        }
    })
}

/// A line break or the end of input.
pub fn eol<'s, C>() -> impl Parser<'s, C, Output = ()> {
    let newline = newline();
    parser(move |state: ParseState<'s>, ctx: &mut C| {
        if state.is_eof() {
            return Ok(((), state));
        }
        newline.parse(state, ctx).map_err(|_| {
            ParseError::Expected(ParseFailure {
                index: state.index(),
                expected: vec!["line break".into(), "end of input".into()],
            })
        })
    })
}

/// Exact text.
pub fn tag<'s, C>(text: &'static str) -> impl Parser<'s, C, Output = &'s str> {
    parser(move |state: ParseState<'s>, _ctx: &mut C| {
        if state.rest().starts_with(text) {
            Ok((&state.rest()[..text.len()], state.advance(text.len())))
        } else {
            Err(ParseError::expected(state.index(), text))
        }
    })
}

/// A whole word: `word` not followed by another letter, digit or underscore.
pub fn keyword<'s, C>(word: &'static str) -> impl Parser<'s, C, Output = &'s str> {
    parser(move |state: ParseState<'s>, _ctx: &mut C| {
        let rest = state.rest();
        let matched = rest.starts_with(word) && !rest[word.len()..].starts_with(is_word_char);
        if matched {
            Ok((&rest[..word.len()], state.advance(word.len())))
        } else {
            Err(ParseError::expected(state.index(), word))
        }
    })
}

/// Operator spelling: alphabetic spellings must be whole words.
pub fn symbol<'s, C>(spelling: &'static str) -> impl Parser<'s, C, Output = &'s str> {
    let word = spelling.starts_with(is_word_char);
    let exact = tag(spelling);
    let whole = keyword(spelling);
    parser(move |state: ParseState<'s>, ctx: &mut C| {
        if word {
            whole.parse(state, ctx)
        } else {
            exact.parse(state, ctx)
        }
    })
}

/// Decimal number with optional sign and fraction; `_` may separate digits.
pub fn number<'s, C>() -> impl Parser<'s, C, Output = f64> {
    parser(|state: ParseState<'s>, _ctx: &mut C| {
        let rest = state.rest();
        let bytes = rest.as_bytes();
        let digits_from = |start: usize| {
            if bytes.get(start).is_some_and(u8::is_ascii_digit) {
                start
                    + bytes[start..]
                        .iter()
                        .take_while(|b| b.is_ascii_digit() || **b == b'_')
                        .count()
            } else {
                start
            }
        };
        let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
        let mut end = digits_from(sign);
        if end == sign {
            return Err(ParseError::expected(state.index(), "number"));
        }
        if bytes.get(end) == Some(&b'.') {
            let fraction = digits_from(end + 1);
            if fraction > end + 1 {
                end = fraction;
            }
        }
        let text: String = rest[..end].chars().filter(|c| *c != '_').collect();
        match text.parse::<f64>() {
            Ok(value) => Ok((value, state.advance(end))),
            Err(_) => Err(ParseError::expected(state.index(), "number")),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::PResult;

    fn run<'s, P: Parser<'s, ()>>(parser: P, source: &'s str) -> PResult<'s, P::Output> {
        parser.parse(ParseState::new(source, 4), &mut ())
    }

    #[test]
    fn numbers_accept_sign_fraction_and_separators() {
        assert_eq!(run(number(), "01234567890").unwrap().0, 1_234_567_890.0);
        assert_eq!(run(number(), "+42").unwrap().0, 42.0);
        assert_eq!(run(number(), "-1.25").unwrap().0, -1.25);
        assert_eq!(run(number(), "1_000").unwrap().0, 1000.0);
        let (value, state) = run(number(), "3.x").unwrap();
        assert_eq!((value, state.index()), (3.0, 1));
        assert!(run(number(), "-x").is_err());
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert!(run(keyword("wait"), "wait").is_ok());
        assert!(run(keyword("wait"), "wait here").is_ok());
        assert!(run(keyword("wait"), "waiting").is_err());
        assert!(run(symbol("or"), "order").is_err());
        assert_eq!(run(symbol("||"), "||x").unwrap().1.index(), 2);
    }

    #[test]
    fn line_breaks_in_all_styles() {
        assert_eq!(run(newline(), "\r\nx").unwrap().1.index(), 2);
        assert_eq!(run(newline(), "\rx").unwrap().1.index(), 1);
        assert!(run(eol(), "").is_ok());
        let err = run(eol(), "x").unwrap_err();
        assert_eq!(err, ParseError::Expected(ParseFailure {
            index: 0,
            expected: vec!["line break".into(), "end of input".into()],
        }));
    }

    #[test]
    fn blank_runs() {
        let (text, state) = run(spaces(), " \t x").unwrap();
        assert_eq!((text, state.index()), (" \t ", 3));
        assert!(run(spaces1(), "x").is_err());
        assert_eq!(run(whitespaces(), " \n\t x").unwrap().1.index(), 4);
    }
}
