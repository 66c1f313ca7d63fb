//! Dialog text, choice prompts and quoted strings.
//!
//! A text block runs over every following line indented past the reference column.
//! Lines are joined with one space. Substitutions in braces may hold a variable,
//! arithmetic, logic or a string operand.

use hearsay_data::StringExpression;

use super::Context;
use super::expression::{logic, math, string_operand, variable_name};
use crate::parse::{
    PResult, ParseState, Parser, Transaction, any_char, block, character, eol, followed_by, indented, same_or_indented,
    satisfy, spaces, spaces1, whitespaces,
};

/// Dialog text: one or more lines, continuation lines indented past the speaker.
pub fn text<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    block(text_line, indented(), 1).map(join_lines).parse(state, ctx)
}

/// Choice prompt: lines starting with `>`, continuation lines not dedented.
pub fn prompt<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    let marker = || character('>').then(spaces());
    block(
        marker().then(text_line),
        same_or_indented().skip(followed_by(marker())),
        1,
    )
    .map(join_lines)
    .parse(state, ctx)
}

fn join_lines(lines: Vec<StringExpression>) -> StringExpression {
    lines
        .into_iter()
        .reduce(|text, line| {
            StringExpression::concat(StringExpression::concat(text, StringExpression::literal(" ")), line)
        })
        .unwrap_or_else(|| StringExpression::literal(""))
        .simplify()
}

/// The rest of one line. Leading blanks collapse to a single space; trailing
/// blanks are dropped.
fn text_line<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    let mut tx = Transaction::begin(state, ctx);
    let leading = if tx.attempt(spaces1())?.is_some() { " " } else { "" };
    let run: String = tx
        .run(any_char().until(eol().or(character('{').to(()))))?
        .into_iter()
        .collect();

    if tx.peek(eol())? {
        let run = run.trim_end();
        let line = if run.is_empty() {
            String::new()
        } else {
            format!("{leading}{run}")
        };
        return tx.finish(StringExpression::literal(line));
    }

    let inserted = tx.run(substitution)?;
    let rest = tx.run(text_line)?;
    let head = StringExpression::concat(StringExpression::literal(format!("{leading}{run}")), inserted);
    tx.finish(StringExpression::concat(head, rest))
}

/// `{ ... }`. A lone variable keeps whatever type it resolves to.
pub fn substitution<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    let close = || whitespaces().then(character('}'));
    character('{')
        .then(
            whitespaces()
                .then(variable_name())
                .skip(close())
                .map(StringExpression::Interpolate)
                .or(math.skip(close()).map(StringExpression::from_number))
                .or(logic.skip(close()).map(StringExpression::from_boolean))
                .or(string_operand.skip(close())),
        )
        .parse(state, ctx)
}

/// `"..."` with `\n`, `\r`, `\{`, `\"` and `\\` escapes and `{ }` substitutions.
pub fn quote<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    character('"')
        .then(quote_body)
        .skip(character('"'))
        .map(StringExpression::simplify)
        .parse(state, ctx)
}

fn quote_body<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    let mut tx = Transaction::begin(state, ctx);
    let run: String = tx
        .run(any_char().until(satisfy(|c| matches!(c, '\\' | '{' | '"'), "closing '\"'")))?
        .into_iter()
        .collect();
    let head = StringExpression::literal(run);

    let piece = match tx.attempt(escape)? {
        Some(c) => Some(StringExpression::literal(c)),
        None => tx.attempt(substitution)?,
    };
    match piece {
        Some(piece) => {
            let rest = tx.run(quote_body)?;
            tx.finish(StringExpression::concat(StringExpression::concat(head, piece), rest))
        },
        None => tx.finish(head),
    }
}

fn escape<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, String> {
    character('\\')
        .then(
            character('n')
                .to('\n')
                .or(character('r').to('\r'))
                .or(character('{'))
                .or(character('"'))
                .or(character('\\')),
        )
        .map(String::from)
        .parse(state, ctx)
}
