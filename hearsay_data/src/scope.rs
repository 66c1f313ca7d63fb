//! Variable storage consulted when expressions are evaluated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Value, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("cannot change the type of \"{name}\" from {from} to {to}")]
    TypeChange {
        name: String,
        from: ValueType,
        to: ValueType,
    },
}

/// A flat name to value mapping. Once a name holds a value, it keeps that value's category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Set `name` to `value`, returning the previous value if there was one.
    ///
    /// # Errors
    /// Returns [`ScopeError::TypeChange`] if `name` already holds a value of another category.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>, ScopeError> {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.vars.get(&name)
            && existing.value_type() != value.value_type()
        {
            return Err(ScopeError::TypeChange {
                from: existing.value_type(),
                to: value.value_type(),
                name,
            });
        }
        Ok(self.vars.insert(name, value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}
