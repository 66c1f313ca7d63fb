//! Shared data model for Hearsay scripts: values, expressions, nodes and the
//! compiled block graph, plus the scope and bindings they are evaluated against.

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod binding;
pub mod expression;
pub mod node;
pub mod scope;
pub mod script;
pub mod validate;
pub mod value;

pub use binding::{BindingHint, BindingRegistry, Bindings, NoBindings};
pub use expression::{
    BooleanExpression, Call, CompareOp, Comparison, EvalError, Expression, NumberExpression, StringExpression,
};
pub use node::{ClearKind, Node};
pub use scope::{Scope, ScopeError};
pub use script::{MAIN, Script};
pub use validate::{ValidationError, validate_script};
pub use value::{Number, Value, ValueType};
