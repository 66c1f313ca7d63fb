//! Executable nodes of a compiled script.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NumberExpression, StringExpression};

/// What a `clear` node removes from the presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearKind {
    #[default]
    All,
    Choices,
    Dialog,
}

impl fmt::Display for ClearKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearKind::All => write!(f, "all"),
            ClearKind::Choices => write!(f, "choices"),
            ClearKind::Dialog => write!(f, "dialog"),
        }
    }
}

/// One instruction in a block.
///
/// Nodes hold only their own payload; which block a `Jump` or `Choice` leads
/// to is looked up by id in the [`Script`](crate::Script).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    /// Replace the visible dialogue.
    Say {
        speaker: Option<String>,
        dialog: StringExpression,
    },
    /// Add to the visible dialogue.
    Append {
        speaker: Option<String>,
        dialog: StringExpression,
    },
    /// Offer a choice leading to the block `id`.
    Choice { id: String, text: StringExpression },
    /// Wait for one of the offered choices to be picked.
    Choose,
    Clear(ClearKind),
    Jump(String),
    Wait,
    /// Suspend for the given number of seconds.
    Pause(NumberExpression),
    Return,
}

impl Node {
    pub fn say(speaker: Option<&str>, dialog: impl Into<String>) -> Self {
        Node::Say {
            speaker: speaker.map(str::to_string),
            dialog: StringExpression::literal(dialog),
        }
    }

    pub fn append(speaker: Option<&str>, dialog: impl Into<String>) -> Self {
        Node::Append {
            speaker: speaker.map(str::to_string),
            dialog: StringExpression::literal(dialog),
        }
    }

    pub fn choice(id: impl Into<String>, text: impl Into<String>) -> Self {
        Node::Choice {
            id: id.into(),
            text: StringExpression::literal(text),
        }
    }

    pub fn jump(id: impl Into<String>) -> Self {
        Node::Jump(id.into())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Say { speaker, dialog } => write!(f, "{}: {dialog}", speaker.as_deref().unwrap_or_default()),
            Node::Append { speaker, dialog } => write!(f, "{}+ {dialog}", speaker.as_deref().unwrap_or_default()),
            Node::Choice { id, text } => write!(f, "choice [{id}] > {text}"),
            Node::Choose => write!(f, "choose"),
            Node::Clear(kind) => write!(f, "clear {kind}"),
            Node::Jump(id) => write!(f, "jump [{id}]"),
            Node::Wait => write!(f, "wait"),
            Node::Pause(seconds) => write!(f, "pause {seconds} s"),
            Node::Return => write!(f, "return"),
        }
    }
}
