//! Host functions callable from expressions.
//!
//! The compiler only needs each binding's signature, which it reads through
//! [`BindingRegistry`]. The runtime [`Bindings`] table also holds the functions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EvalError, Value, ValueType};

/// Declared parameter and result categories of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingHint {
    pub params: Vec<ValueType>,
    pub result: ValueType,
}

impl BindingHint {
    pub fn new(params: impl Into<Vec<ValueType>>, result: ValueType) -> Self {
        Self {
            params: params.into(),
            result,
        }
    }
}

/// Read-only view of the bindings a script may call.
pub trait BindingRegistry {
    fn hint(&self, name: &str) -> Option<&BindingHint>;
}

/// A registry with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBindings;

impl BindingRegistry for NoBindings {
    fn hint(&self, _name: &str) -> Option<&BindingHint> {
        None
    }
}

type Function = Box<dyn Fn(&[Value]) -> Value>;

struct Binding {
    hint: BindingHint,
    function: Function,
}

/// Named host functions with their signatures.
#[derive(Default)]
pub struct Bindings {
    bindings: HashMap<String, Binding>,
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.bindings.iter().map(|(name, b)| (name, &b.hint)))
            .finish()
    }
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any earlier binding of that name.
    pub fn bind<F>(&mut self, name: impl Into<String>, hint: BindingHint, function: F)
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.bindings.insert(
            name.into(),
            Binding {
                hint,
                function: Box::new(function),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Call a binding after checking the arguments and the result against its hint.
    ///
    /// # Errors
    /// Fails if the binding is unknown, the argument count or categories are wrong,
    /// or the function returns a value of the wrong category.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| EvalError::UnknownBinding(name.to_string()))?;
        if args.len() != binding.hint.params.len() {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected: binding.hint.params.len(),
                found: args.len(),
            });
        }
        if let Some((param, arg)) = binding
            .hint
            .params
            .iter()
            .zip(args)
            .find(|(param, arg)| arg.value_type() != **param)
        {
            return Err(EvalError::TypeMismatch {
                name: name.to_string(),
                expected: *param,
                found: arg.value_type(),
            });
        }
        let result = (binding.function)(args);
        if result.value_type() != binding.hint.result {
            return Err(EvalError::TypeMismatch {
                name: name.to_string(),
                expected: binding.hint.result,
                found: result.value_type(),
            });
        }
        Ok(result)
    }
}

impl BindingRegistry for Bindings {
    fn hint(&self, name: &str) -> Option<&BindingHint> {
        self.bindings.get(name).map(|b| &b.hint)
    }
}
