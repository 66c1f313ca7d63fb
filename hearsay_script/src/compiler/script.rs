//! Scripts, nodes, labels and choices.
//!
//! A script is a block of lines at one indentation level. Each line is a node, a
//! `label` introducing a named block, or a `choice` whose options each become a
//! named block. Nested scripts are folded into one flat [`Script`] graph whose
//! unnamed top level is the main block.

use hearsay_data::{ClearKind, Node, NumberExpression, Script, StringExpression};
use log::debug;

use super::Context;
use super::expression::{identifier, math};
use super::text::{prompt, text};
use crate::idgen::choice_id;
use crate::parse::{
    Journal, PResult, ParseError, ParseState, Parser, Transaction, block, character, eol, followed_by, indented,
    keyword, line_end, parser, same, spaces, spaces1, whitespaces,
};

/// A sequence of lines at the indentation of the first one.
pub fn script<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Script> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(whitespaces())?;
    tx.indent_here();
    let line = node.map(|n: Node| Script::from_main(vec![n])).or(choice).or(label);
    let parts = tx.run(block(line, same(), 0))?;
    let graph = parts.into_iter().fold(Script::new(), Script::merge);
    tx.finish(graph)
}

/// Any single-line statement.
pub fn node<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    say.or(append)
        .or(clear)
        .or(choose)
        .or(jump)
        .or(wait)
        .or(pause)
        .or(return_)
        .parse(state, ctx)
}

/// `speaker: text`, replacing what is on screen.
pub fn say<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    dialog(':')
        .map(|(speaker, dialog): (Option<String>, StringExpression)| Node::Say { speaker, dialog })
        .parse(state, ctx)
}

/// `speaker+ text`, continuing the last line.
pub fn append<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    dialog('+')
        .map(|(speaker, dialog): (Option<String>, StringExpression)| Node::Append { speaker, dialog })
        .parse(state, ctx)
}

fn dialog<'s, 'r>(
    delimiter: char,
) -> impl Parser<'s, Context<'r>, Output = (Option<String>, StringExpression)> {
    parser(move |state: ParseState<'s>, ctx: &mut Context<'r>| {
        let mut tx = Transaction::begin(state, ctx);
        tx.indent_here();
        let speaker = tx.attempt(identifier())?;
        tx.run(spaces())?;
        tx.run(character(delimiter))?;
        tx.run(whitespaces())?;
        let dialog = tx.run(text)?;
        tx.finish((speaker, dialog))
    })
}

/// `clear`, optionally followed by `all`, `choices` or `dialog`.
pub fn clear<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(keyword("clear"))?;
    tx.commit();
    if tx.attempt(spaces1())?.is_none() || tx.peek(eol())? {
        return tx.settle(Node::Clear(ClearKind::All));
    }
    let kind = tx.run(
        keyword("all")
            .to(ClearKind::All)
            .or(keyword("choices").to(ClearKind::Choices))
            .or(keyword("dialog").to(ClearKind::Dialog)),
    )?;
    tx.finish(Node::Clear(kind))
}

pub fn choose<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    keyword("choose").to(Node::Choose).parse(state, ctx)
}

/// `jump id` or `jump [id]`. The target is checked once the whole graph is known.
pub fn jump<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(keyword("jump").then(spaces1()))?;
    let at = tx.index();
    let id = tx.run(bracketed().or(identifier()))?;
    tx.ctx().jump_to(at, &id);
    tx.finish(Node::Jump(id))
}

pub fn wait<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    keyword("wait").to(Node::Wait).parse(state, ctx)
}

/// `pause <math> <unit>`, stored in seconds.
pub fn pause<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(keyword("pause").then(spaces1()))?;
    let amount = tx.run(math)?;
    tx.run(spaces())?;
    let scale = tx.run(time_unit())?;
    let seconds = NumberExpression::multiply(amount, NumberExpression::literal(scale));
    tx.finish(Node::Pause(seconds.simplify()))
}

fn time_unit<'s, C: Journal>() -> impl Parser<'s, C, Output = f64> {
    keyword("milliseconds")
        .or(keyword("ms"))
        .to(0.001)
        .or(keyword("seconds").or(keyword("s")).to(1.0))
        .or(keyword("minutes").or(keyword("m")).to(60.0))
}

/// `return`
pub fn return_<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Node> {
    keyword("return").to(Node::Return).parse(state, ctx)
}

/// `label [id]` followed by an indented script, which becomes block `id`.
pub fn label<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Script> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(keyword("label").then(spaces1()))?;
    let at = tx.index();
    let id = tx.run(bracketed())?;
    tx.ctx().declare(at, &id)?;
    let mut body = tx.run(nested_script())?;
    body.rename_main(&id);
    tx.finish(body)
}

/// `choice` or `choice [id]`, then an indented block of options. Each option is a
/// `>` prompt with an indented script under it.
///
/// Each option's script becomes its own block. The first option takes the explicit
/// id when there is one; every other option is named after its prompt text. The
/// enclosing block gets one [`Node::Choice`] per option.
pub fn choice<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, Script> {
    let mut tx = Transaction::begin(state, ctx);
    tx.run(keyword("choice"))?;
    let named = tx.attempt(spaces1().then(positioned(bracketed())))?;
    if let Some((at, id)) = &named {
        tx.ctx().declare(*at, id)?;
    }
    tx.run(line_end().then(whitespaces()).then(indented()))?;
    tx.indent_here();
    let options = tx.run(block(option, same().skip(followed_by(character('>'))), 1))?;

    let mut explicit = named.map(|(_, id)| id);
    let mut offers = Vec::with_capacity(options.len());
    let mut blocks = Script::new();
    for (at, text, mut body) in options {
        let id = match explicit.take() {
            Some(id) => id,
            None => {
                let digest = text.as_literal().map_or_else(|| text.to_string(), str::to_string);
                let id = choice_id(&digest);
                if tx.ctx().is_declared(&id) {
                    return Err(ParseError::reason(
                        at,
                        format!("the option \"{text}\" is offered twice; give one of them an explicit name"),
                    ));
                }
                tx.ctx().declare(at, &id)?;
                id
            },
        };
        debug!("choice option \"{text}\" -> block '{id}'");
        body.rename_main(&id);
        offers.push(Node::Choice { id, text });
        blocks = blocks.merge(body);
    }
    tx.finish(Script::from_main(offers).merge(blocks))
}

fn option<'s>(state: ParseState<'s>, ctx: &mut Context<'_>) -> PResult<'s, (usize, StringExpression, Script)> {
    let mut tx = Transaction::begin(state, ctx);
    let at = tx.index();
    let text = tx.run(prompt)?;
    let body = tx.run(nested_script())?;
    tx.finish((at, text, body))
}

/// The end of the current line, then a script indented past the reference column.
fn nested_script<'s, 'r>() -> impl Parser<'s, Context<'r>, Output = Script> {
    line_end().then(whitespaces()).then(indented()).then(script)
}

/// `[id]`, blanks allowed inside the brackets.
fn bracketed<'s, C: Journal>() -> impl Parser<'s, C, Output = String> {
    character('[')
        .then(spaces())
        .then(identifier())
        .skip(spaces())
        .skip(character(']'))
}

fn positioned<'s, C, P>(p: P) -> impl Parser<'s, C, Output = (usize, P::Output)>
where
    P: Parser<'s, C>,
{
    parser(move |state: ParseState<'s>, ctx: &mut C| {
        let (value, next) = p.parse(state, ctx)?;
        Ok(((state.index(), value), next))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearsay_data::NoBindings;

    fn parse_node(source: &str) -> Node {
        let mut ctx = Context::new(&NoBindings);
        node(ParseState::new(source, 4), &mut ctx).unwrap().0
    }

    #[test]
    fn speakers_are_optional() {
        assert_eq!(parse_node("alice: Hi"), Node::say(Some("alice"), "Hi"));
        assert_eq!(parse_node(": Hi"), Node::say(None, "Hi"));
        assert_eq!(parse_node("bob + and more"), Node::append(Some("bob"), "and more"));
    }

    #[test]
    fn clear_qualifiers() {
        assert_eq!(parse_node("clear"), Node::Clear(ClearKind::All));
        assert_eq!(parse_node("clear choices"), Node::Clear(ClearKind::Choices));
        assert_eq!(parse_node("clear dialog"), Node::Clear(ClearKind::Dialog));
        assert_eq!(parse_node("clear   \nnext"), Node::Clear(ClearKind::All));
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(parse_node("wait"), Node::Wait);
        assert_eq!(parse_node("waiter: Sir?"), Node::say(Some("waiter"), "Sir?"));
        assert_eq!(parse_node("return"), Node::Return);
        assert_eq!(parse_node("choose"), Node::Choose);
    }

    #[test]
    fn pause_scales_to_seconds() {
        assert_eq!(parse_node("pause 1.5 s"), Node::Pause(NumberExpression::literal(1.5)));
        assert_eq!(parse_node("pause 250ms"), Node::Pause(NumberExpression::literal(0.25)));
        assert_eq!(parse_node("pause 2 minutes"), Node::Pause(NumberExpression::literal(120.0)));
        assert_eq!(
            parse_node("pause delay seconds"),
            Node::Pause(NumberExpression::multiply(
                NumberExpression::Variable("delay".into()),
                NumberExpression::literal(1.0)
            ))
        );
    }

    #[test]
    fn jump_accepts_both_forms() {
        assert_eq!(parse_node("jump start"), Node::jump("start"));
        assert_eq!(parse_node("jump [ start ]"), Node::jump("start"));
    }

    #[test]
    fn explicit_choice_name_goes_to_the_first_option() {
        let source = "choice [menu]\n  > Tea\n    : Tea it is.\n  > Coffee\n    : Coffee then.\n";
        let mut ctx = Context::new(&NoBindings);
        let (graph, _) = choice(ParseState::new(source, 4), &mut ctx).unwrap();
        let main = graph.main().unwrap();
        assert_eq!(main[0], Node::choice("menu", "Tea"));
        let coffee = choice_id("Coffee");
        assert_eq!(main[1], Node::choice(coffee.as_str(), "Coffee"));
        assert_eq!(graph.block("menu"), Some(&[Node::say(None, "Tea it is.")][..]));
        assert!(graph.contains(&coffee));
    }
}
