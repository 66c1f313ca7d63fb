//! Logic, comparison and arithmetic expressions.
//!
//! Precedence, loosest first: `or`/`||`, `xor`/`^`, `and`/`&&`, then `not`/`!`,
//! comparisons and atoms. Arithmetic has `+ -` over `* /` over parentheses,
//! literals, calls and variables. Every operand and operator may be preceded by
//! whitespace, including line breaks, as long as the new line is not dedented past
//! the reference column.

use hearsay_data::{BooleanExpression, Call, CompareOp, Comparison, Expression, NumberExpression, StringExpression, ValueType};

use super::Context;
use super::text::quote;
use crate::parse::{
    Journal, PResult, ParseError, ParseFailure, ParseState, Parser, Transaction, character, is_word_char, keyword,
    not_followed_by, number, parser, same_or_indented, spaces1, symbol, tag, take_while1, whitespaces,
};

/// Words that are never variable names.
pub const RESERVED: &[&str] = &["true", "false", "and", "or", "xor", "not", "is"];

type NumberOp = fn(NumberExpression, NumberExpression) -> NumberExpression;
type BooleanOp = fn(BooleanExpression, BooleanExpression) -> BooleanExpression;

/// Skip whitespace, require the line not to be dedented, then run `p`.
pub fn lexeme<'s, C, P>(p: P) -> impl Parser<'s, C, Output = P::Output>
where
    C: Journal,
    P: Parser<'s, C>,
{
    whitespaces().then(same_or_indented()).then(p)
}

/// Letters, digits and underscores, starting with a letter.
pub fn identifier<'s, C: Journal>() -> impl Parser<'s, C, Output = String> {
    take_while1(is_word_char, "identifier")
        .verify(|id: &&str| !id.starts_with(|c: char| c.is_ascii_digit()), "identifier")
        .verify(
            |id: &&str| !id.starts_with('_'),
            "identifier (names starting with '_' are reserved)",
        )
        .map(str::to_string)
}

fn unreserved<'s, C: Journal>() -> impl Parser<'s, C, Output = String> {
    identifier().verify(|id: &String| !RESERVED.contains(&id.as_str()), "name")
}

/// An identifier usable as a variable: not reserved and not the start of a call.
pub fn variable_name<'s, C: Journal>() -> impl Parser<'s, C, Output = String> {
    unreserved().skip(not_followed_by(character('('), "variable"))
}

fn variable<'s, 'r>(category: ValueType) -> impl Parser<'s, Context<'r>, Output = String> {
    let name = variable_name();
    parser(move |state: ParseState<'s>, ctx: &mut Context<'r>| {
        let (id, next) = name.parse(state, ctx)?;
        ctx.use_variable(state.index(), &id, category);
        Ok((id, next))
    })
}

/// `name(args)`, a call to a binding returning `category`. The binding must exist and receive
/// exactly the declared number of arguments; those are fatal errors. A binding of
/// another result category is an ordinary mismatch.
fn call<'s, 'r>(category: ValueType) -> impl Parser<'s, Context<'r>, Output = Call> {
    parser(move |state: ParseState<'s>, ctx: &mut Context<'r>| {
        let mut tx = Transaction::begin(state, ctx);
        let at = tx.index();
        let name = tx.run(unreserved())?;
        tx.run(character('('))?;
        let Some(hint) = tx.ctx().binding(&name) else {
            return Err(ParseError::reason(at, format!("no binding named \"{name}\"")));
        };
        if hint.result != category {
            return Err(ParseError::expected(at, format!("{category} expression")));
        }
        let arity = || {
            ParseError::reason(
                at,
                format!("\"{name}\" takes {} argument(s)", hint.params.len()),
            )
        };
        let mut args = Vec::with_capacity(hint.params.len());
        for (i, param) in hint.params.iter().enumerate() {
            if tx.peek(lexeme(character(')')))? {
                return Err(arity());
            }
            if i > 0 && tx.attempt(lexeme(character(',')))?.is_none() {
                return Err(arity());
            }
            args.push(tx.run(argument(*param))?);
        }
        if tx.attempt(lexeme(character(')')))?.is_none() {
            return Err(arity());
        }
        tx.finish(Call::new(name, args))
    })
}

fn argument<'s, 'r>(category: ValueType) -> impl Parser<'s, Context<'r>, Output = Expression> {
    parser(move |state: ParseState<'s>, ctx: &mut Context<'r>| match category {
        ValueType::Number => sum.map(Expression::Number).parse(state, ctx),
        ValueType::Boolean => disjunction.map(Expression::Boolean).parse(state, ctx),
        ValueType::String => string_operand.map(Expression::String).parse(state, ctx),
    })
}

/// One of `spellings`, preceded by whitespace, yielding `value`.
fn operator<'s, C, T>(value: T, spellings: &'static [&'static str]) -> impl Parser<'s, C, Output = T>
where
    C: Journal,
    T: Clone,
{
    lexeme(parser(move |state: ParseState<'s>, ctx: &mut C| {
        for spelling in spellings {
            if let Ok((_, next)) = symbol(*spelling).parse(state, ctx) {
                return Ok((value.clone(), next));
            }
        }
        Err(ParseError::Expected(ParseFailure {
            index: state.index(),
            expected: spellings.iter().map(|s| (*s).to_string()).collect(),
        }))
    }))
}

fn compare_op<'s, C: Journal>() -> impl Parser<'s, C, Output = CompareOp> {
    let is_not = keyword("is").then(spaces1()).then(keyword("not"));
    lexeme(
        is_not
            .to(CompareOp::IsNot)
            .or(tag("!=").to(CompareOp::IsNot))
            .or(keyword("is").to(CompareOp::Is))
            .or(tag("==").to(CompareOp::Is)),
    )
}

/// Arithmetic expression, constant-folded.
pub fn math<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, NumberExpression> {
    sum.map(NumberExpression::simplify).parse(state, ctx)
}

fn sum<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, NumberExpression> {
    let add = operator(NumberExpression::add as NumberOp, &["+"]);
    let subtract = operator(NumberExpression::subtract as NumberOp, &["-"]);
    product.chain_l1(add.or(subtract)).parse(state, ctx)
}

fn product<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, NumberExpression> {
    let multiply = operator(NumberExpression::multiply as NumberOp, &["*"]);
    let divide = operator(NumberExpression::divide as NumberOp, &["/"]);
    number_piece.chain_l1(multiply.or(divide)).parse(state, ctx)
}

fn number_piece<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, NumberExpression> {
    lexeme(character('('))
        .then(sum)
        .skip(lexeme(character(')')))
        .or(lexeme(number()).map(NumberExpression::literal))
        .or(lexeme(call(ValueType::Number)).map(NumberExpression::Call))
        .or(lexeme(variable(ValueType::Number)).map(NumberExpression::Variable))
        .parse(state, ctx)
}

/// Logic expression, constant-folded.
pub fn logic<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    disjunction.map(BooleanExpression::simplify).parse(state, ctx)
}

fn disjunction<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    exclusive
        .chain_l1(operator(BooleanExpression::or as BooleanOp, &["or", "||"]))
        .parse(state, ctx)
}

fn exclusive<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    conjunction
        .chain_l1(operator(BooleanExpression::xor as BooleanOp, &["xor", "^"]))
        .parse(state, ctx)
}

fn conjunction<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    unary
        .chain_l1(operator(BooleanExpression::and as BooleanOp, &["and", "&&"]))
        .parse(state, ctx)
}

fn unary<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    negation.or(relation).parse(state, ctx)
}

/// A comparison or a lone boolean operand.
///
/// The boolean operand is parsed once. Number and string comparisons are only tried
/// when it fails, or when what follows it shows it was not the whole operand.
fn relation<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    let arithmetic = || operator((), &["+", "-", "*", "/"]);
    let mut tx = Transaction::begin(state, ctx);
    if let Some(compared) = tx.attempt(variable_comparison)? {
        return tx.finish(BooleanExpression::compare(compared));
    }
    if let Some(left) = tx.attempt(boolean_atom)? {
        if let Some(op) = tx.attempt(compare_op())? {
            if let Some(right) = tx.attempt(boolean_atom)? {
                if !tx.peek(arithmetic())? {
                    return tx.finish(BooleanExpression::compare(Comparison::Boolean { op, left, right }));
                }
            }
        } else if !tx.peek(arithmetic())? {
            return tx.finish(left);
        }
        tx.rollback();
    }
    let compared = tx.run(number_comparison.or(string_comparison))?;
    tx.finish(BooleanExpression::compare(compared))
}

fn negation<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    let bang = tag("!").skip(not_followed_by(character('='), "'!'"));
    lexeme(keyword("not").or(bang))
        .then(unary)
        .map(BooleanExpression::not)
        .parse(state, ctx)
}

fn boolean_atom<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    lexeme(character('('))
        .then(disjunction)
        .skip(lexeme(character(')')))
        .or(lexeme(keyword("true")).to(BooleanExpression::Literal(true)))
        .or(lexeme(keyword("false")).to(BooleanExpression::Literal(false)))
        .or(lexeme(call(ValueType::Boolean)).map(BooleanExpression::Call))
        .or(lexeme(variable(ValueType::Boolean)).map(BooleanExpression::Variable))
        .parse(state, ctx)
}

/// Equality test. Boolean operands are tried first, then numbers, then strings;
/// two bare variables are compared without fixing their category.
pub fn comparison<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, BooleanExpression> {
    comparison_expr.map(Comparison::simplify).parse(state, ctx)
}

fn comparison_expr<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Comparison> {
    variable_comparison
        .or(boolean_comparison)
        .or(number_comparison)
        .or(string_comparison)
        .parse(state, ctx)
}

fn variable_comparison<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Comparison> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(whitespaces().then(same_or_indented()))?;
    let at = tx.index();
    let left = tx.run(variable_name())?;
    let op = tx.run(compare_op())?;
    let right = tx.run(lexeme(variable_name()))?;
    tx.run(not_followed_by(
        operator((), &["+", "-", "*", "/"]),
        "end of comparison",
    ))?;
    tx.ctx().link_variables(at, &left, &right);
    tx.finish(Comparison::Variables { op, left, right })
}

fn boolean_comparison<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Comparison> {
    let mut tx = Transaction::begin(state, ctx);
    let left = tx.run(boolean_atom)?;
    let op = tx.run(compare_op())?;
    let right = tx.run(boolean_atom)?;
    tx.finish(Comparison::Boolean { op, left, right })
}

fn number_comparison<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Comparison> {
    let mut tx = Transaction::begin(state, ctx);
    let left = tx.run(sum)?;
    let op = tx.run(compare_op())?;
    let right = tx.run(sum)?;
    tx.finish(Comparison::Number { op, left, right })
}

fn string_comparison<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Comparison> {
    let mut tx = Transaction::begin(state, ctx);
    let left = tx.run(string_operand)?;
    let op = tx.run(compare_op())?;
    let right = tx.run(string_operand)?;
    tx.finish(Comparison::String { op, left, right })
}

/// A quoted string, a string-valued call, or a string variable.
pub fn string_operand<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, StringExpression> {
    lexeme(quote)
        .or(lexeme(call(ValueType::String)).map(StringExpression::Call))
        .or(lexeme(variable(ValueType::String)).map(StringExpression::Variable))
        .parse(state, ctx)
}
