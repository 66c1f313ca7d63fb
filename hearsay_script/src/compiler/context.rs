//! Bookkeeping shared by every grammar rule during one compilation.
//!
//! Facts are appended to logs that [`Journal`] can truncate, so a rule that is
//! abandoned while backtracking takes its declarations and variable uses with it.

use std::collections::{BTreeMap, HashMap};

use hearsay_data::{BindingHint, BindingRegistry, Script, ValueType};
use log::debug;

use crate::parse::{Journal, ParseError};

use super::{CompileError, SourceMap};

#[derive(Debug, Clone)]
struct Declared {
    id: String,
    index: usize,
}

#[derive(Debug, Clone)]
enum Fact {
    Typed { name: String, category: ValueType },
    Linked { left: String, right: String },
}

/// Journal position of every log in the [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    declared: usize,
    jumps: usize,
    facts: usize,
}

pub struct Context<'r> {
    registry: &'r dyn BindingRegistry,
    declared: Vec<Declared>,
    jumps: Vec<Declared>,
    facts: Vec<(usize, Fact)>,
}

impl<'r> Context<'r> {
    pub fn new(registry: &'r dyn BindingRegistry) -> Self {
        Self {
            registry,
            declared: Vec::new(),
            jumps: Vec::new(),
            facts: Vec::new(),
        }
    }

    pub fn binding(&self, name: &str) -> Option<&'r BindingHint> {
        self.registry.hint(name)
    }

    /// Claim a block id.
    ///
    /// # Errors
    /// A fatal error if the id is already in use anywhere in the script.
    pub fn declare(&mut self, index: usize, id: &str) -> Result<(), ParseError> {
        if self.declared.iter().any(|d| d.id == id) {
            return Err(ParseError::reason(
                index,
                format!("the identifier \"{id}\" has already been used"),
            ));
        }
        self.declared.push(Declared {
            id: id.to_string(),
            index,
        });
        Ok(())
    }

    pub fn is_declared(&self, id: &str) -> bool {
        self.declared.iter().any(|d| d.id == id)
    }

    pub fn jump_to(&mut self, index: usize, id: &str) {
        self.jumps.push(Declared {
            id: id.to_string(),
            index,
        });
    }

    pub fn use_variable(&mut self, index: usize, name: &str, category: ValueType) {
        self.facts.push((
            index,
            Fact::Typed {
                name: name.to_string(),
                category,
            },
        ));
    }

    /// Record that two variables must share a category, whichever it turns out to be.
    pub fn link_variables(&mut self, index: usize, left: &str, right: &str) {
        self.facts.push((
            index,
            Fact::Linked {
                left: left.to_string(),
                right: right.to_string(),
            },
        ));
    }

    /// Resolve every variable's category from the recorded facts, in source order.
    ///
    /// # Errors
    /// The first fact that contradicts what is already known.
    pub fn resolve_variables(&self, map: &SourceMap) -> Result<BTreeMap<String, ValueType>, CompileError> {
        let mut facts: Vec<&(usize, Fact)> = self.facts.iter().collect();
        facts.sort_by_key(|(index, _)| *index);

        let mut sets = Unifier::default();
        for (index, fact) in facts {
            let outcome = match fact {
                Fact::Typed { name, category } => sets.assign(name, *category),
                Fact::Linked { left, right } => sets.union(left, right),
            };
            if let Err(conflict) = outcome {
                return Err(CompileError::VariableType {
                    at: map.locate(*index),
                    name: conflict.name,
                    expected: conflict.expected,
                    found: conflict.found,
                });
            }
        }

        let types = sets.resolved();
        for (name, category) in &types {
            debug!("variable '{name}' resolved as {category}");
        }
        Ok(types)
    }

    /// Check every `jump` target against the finished graph.
    ///
    /// # Errors
    /// The first jump whose target block does not exist.
    pub fn check_jumps(&self, script: &Script, map: &SourceMap) -> Result<(), CompileError> {
        match self.jumps.iter().find(|jump| !script.contains(&jump.id)) {
            Some(jump) => Err(CompileError::UnresolvedJump {
                at: map.locate(jump.index),
                id: jump.id.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Journal for Context<'_> {
    type Mark = Mark;

    fn mark(&self) -> Mark {
        Mark {
            declared: self.declared.len(),
            jumps: self.jumps.len(),
            facts: self.facts.len(),
        }
    }

    fn rewind(&mut self, mark: Mark) {
        self.declared.truncate(mark.declared);
        self.jumps.truncate(mark.jumps);
        self.facts.truncate(mark.facts);
    }
}

struct Conflict {
    name: String,
    expected: ValueType,
    found: ValueType,
}

/// Union-find over variable names, each set carrying an optional category.
#[derive(Default)]
struct Unifier {
    parent: HashMap<String, String>,
    category: HashMap<String, ValueType>,
}

impl Unifier {
    fn find(&mut self, name: &str) -> String {
        let parent = match self.parent.get(name) {
            Some(parent) => parent.clone(),
            None => {
                self.parent.insert(name.to_string(), name.to_string());
                return name.to_string();
            },
        };
        if parent == name {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(name.to_string(), root.clone());
        root
    }

    fn assign(&mut self, name: &str, category: ValueType) -> Result<(), Conflict> {
        let root = self.find(name);
        match self.category.get(&root) {
            Some(known) if *known != category => Err(Conflict {
                name: name.to_string(),
                expected: *known,
                found: category,
            }),
            _ => {
                self.category.insert(root, category);
                Ok(())
            },
        }
    }

    fn union(&mut self, left: &str, right: &str) -> Result<(), Conflict> {
        let (a, b) = (self.find(left), self.find(right));
        if a == b {
            return Ok(());
        }
        match (self.category.get(&a).copied(), self.category.get(&b).copied()) {
            (Some(x), Some(y)) if x != y => {
                return Err(Conflict {
                    name: right.to_string(),
                    expected: x,
                    found: y,
                });
            },
            (None, Some(y)) => {
                self.category.insert(a.clone(), y);
            },
            _ => {},
        }
        self.category.remove(&b);
        self.parent.insert(b, a);
        Ok(())
    }

    fn resolved(mut self) -> BTreeMap<String, ValueType> {
        let names: Vec<String> = self.parent.keys().cloned().collect();
        let mut types = BTreeMap::new();
        for name in names {
            let root = self.find(&name);
            if let Some(category) = self.category.get(&root) {
                types.insert(name, *category);
            }
        }
        types
    }
}
