//! Running a single node.
//!
//! [`dispatch_node`] evaluates the node against the scope, applies it to the
//! presentation and reports both the signal for the driver and where control goes
//! next. Moving between blocks is left to the caller, which owns the call stack.

use hearsay_data::{Bindings, ClearKind, Node, NumberExpression, Scope, StringExpression};
use log::{info, trace};

use crate::error::StoryError;
use crate::presentation::Presentation;
use crate::signal::Yield;

/// Where control goes after a node has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Next,
    Jump(String),
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub signal: Yield,
    pub flow: Flow,
}

impl Outcome {
    fn advance() -> Self {
        Self::suspend(Yield::Advance)
    }

    fn suspend(signal: Yield) -> Self {
        Self {
            signal,
            flow: Flow::Next,
        }
    }
}

/// Executes one node.
///
/// # Errors
/// - text or a duration fails to evaluate
/// - `choose` is reached while no choice is open
pub fn dispatch_node(
    node: &Node,
    scope: &Scope,
    bindings: &Bindings,
    view: &mut Presentation,
) -> Result<Outcome, StoryError> {
    use Node::*;
    info!("└─ node: {node}");
    let outcome = match node {
        Say { speaker, dialog } => say(view, speaker.as_deref(), dialog, scope, bindings)?,
        Append { speaker, dialog } => append(view, speaker.as_deref(), dialog, scope, bindings)?,
        Choice { id, text } => offer_choice(view, id, text, scope, bindings)?,
        Choose => choose(view)?,
        Clear(kind) => clear(view, *kind),
        Jump(id) => Outcome {
            signal: Yield::Advance,
            flow: Flow::Jump(id.clone()),
        },
        Wait => Outcome::suspend(Yield::AwaitResume),
        Pause(seconds) => pause(seconds, scope, bindings)?,
        Return => Outcome {
            signal: Yield::Advance,
            flow: Flow::Return,
        },
    };
    trace!("signal: {}", outcome.signal);
    Ok(outcome)
}

fn say(
    view: &mut Presentation,
    speaker: Option<&str>,
    dialog: &StringExpression,
    scope: &Scope,
    bindings: &Bindings,
) -> Result<Outcome, StoryError> {
    view.say(speaker, dialog.evaluate(scope, bindings)?);
    Ok(Outcome::advance())
}

fn append(
    view: &mut Presentation,
    speaker: Option<&str>,
    dialog: &StringExpression,
    scope: &Scope,
    bindings: &Bindings,
) -> Result<Outcome, StoryError> {
    view.append(speaker, &dialog.evaluate(scope, bindings)?);
    Ok(Outcome::advance())
}

fn offer_choice(
    view: &mut Presentation,
    id: &str,
    text: &StringExpression,
    scope: &Scope,
    bindings: &Bindings,
) -> Result<Outcome, StoryError> {
    view.offer(id, text.evaluate(scope, bindings)?);
    Ok(Outcome::advance())
}

fn choose(view: &Presentation) -> Result<Outcome, StoryError> {
    if view.choices().is_empty() {
        return Err(StoryError::NoChoices);
    }
    Ok(Outcome::suspend(Yield::AwaitChoice))
}

fn clear(view: &mut Presentation, kind: ClearKind) -> Outcome {
    view.clear(kind);
    Outcome::advance()
}

/// A duration of zero or less does not suspend.
fn pause(seconds: &NumberExpression, scope: &Scope, bindings: &Bindings) -> Result<Outcome, StoryError> {
    let seconds = seconds.evaluate(scope, bindings)?;
    if seconds > 0.0 {
        Ok(Outcome::suspend(Yield::AwaitDuration(seconds)))
    } else {
        Ok(Outcome::advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearsay_data::EvalError;

    fn run(node: &Node, scope: &Scope, view: &mut Presentation) -> Result<Outcome, StoryError> {
        dispatch_node(node, scope, &Bindings::new(), view)
    }

    #[test]
    fn dialogue_evaluates_against_the_scope() {
        let mut scope = Scope::new();
        scope.set("name", "Bob").unwrap();
        let node = Node::Say {
            speaker: Some("alice".into()),
            dialog: StringExpression::concat(
                StringExpression::literal("Hi "),
                StringExpression::Interpolate("name".into()),
            ),
        };
        let mut view = Presentation::new();
        assert_eq!(run(&node, &scope, &mut view).unwrap(), Outcome::advance());
        assert_eq!(view.lines()[0].text, "Hi Bob");

        scope.set("name", "Carol").unwrap();
        run(&node, &scope, &mut view).unwrap();
        assert_eq!(view.lines()[0].text, "Hi Carol");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let node = Node::Pause(NumberExpression::Variable("delay".into()));
        let err = run(&node, &Scope::new(), &mut Presentation::new()).unwrap_err();
        assert_eq!(err, StoryError::Eval(EvalError::Undefined("delay".into())));
    }

    #[test]
    fn control_nodes() {
        let scope = Scope::new();
        let mut view = Presentation::new();
        assert_eq!(
            run(&Node::jump("end"), &scope, &mut view).unwrap().flow,
            Flow::Jump("end".into())
        );
        assert_eq!(run(&Node::Return, &scope, &mut view).unwrap().flow, Flow::Return);
        assert_eq!(run(&Node::Wait, &scope, &mut view).unwrap().signal, Yield::AwaitResume);
        assert_eq!(
            run(&Node::Pause(NumberExpression::literal(1.5)), &scope, &mut view)
                .unwrap()
                .signal,
            Yield::AwaitDuration(1.5)
        );
        assert_eq!(
            run(&Node::Pause(NumberExpression::literal(0.0)), &scope, &mut view)
                .unwrap()
                .signal,
            Yield::Advance
        );
    }

    #[test]
    fn choose_needs_open_choices() {
        let scope = Scope::new();
        let mut view = Presentation::new();
        assert_eq!(run(&Node::Choose, &scope, &mut view), Err(StoryError::NoChoices));
        run(&Node::choice("left", "Go left"), &scope, &mut view).unwrap();
        assert_eq!(run(&Node::Choose, &scope, &mut view).unwrap().signal, Yield::AwaitChoice);
    }
}
