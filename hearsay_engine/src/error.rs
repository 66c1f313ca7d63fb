use hearsay_data::{EvalError, ScopeError, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoryError {
    #[error("invalid script: {}", join(.0))]
    Invalid(Vec<ValidationError>),
    #[error("no block named '{0}'")]
    UnknownBlock(String),
    #[error("'{0}' is not an open choice")]
    UnknownChoice(String),
    #[error("the story is not waiting for a choice")]
    NotAwaitingChoice,
    #[error("the story is waiting for a choice, not a resume")]
    AwaitingChoice,
    #[error("reached `choose` with no open choices")]
    NoChoices,
    #[error("{0} nodes ran without suspending")]
    Runaway(usize),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
