use std::fmt;

use crate::{Node, Script};

/// Malformed reference found while validating a [`Script`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingBlock { id: String, context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingBlock { id, context } => {
                write!(f, "missing block '{id}' ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that every block a node leads to exists in the graph.
///
/// ```
/// use hearsay_data::{Node, Script, validate_script};
///
/// let script: Script = [
///     ("_main", vec![Node::choice("leave", "Leave"), Node::Choose]),
///     ("leave", vec![Node::Return]),
/// ]
/// .into_iter()
/// .collect();
/// assert!(validate_script(&script).is_empty());
/// ```
pub fn validate_script(script: &Script) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (block, nodes) in script.iter() {
        for (index, node) in nodes.iter().enumerate() {
            let target = match node {
                Node::Jump(id) | Node::Choice { id, .. } => id,
                _ => continue,
            };
            if !script.contains(target) {
                errors.push(ValidationError::MissingBlock {
                    id: target.clone(),
                    context: format!("node {index} of block '{block}'"),
                });
            }
        }
    }
    errors
}
