//! The compiled script graph: block ids mapped to node sequences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Node;

/// Id of the implicit top-level block. The leading underscore keeps it apart
/// from author-declared names.
pub const MAIN: &str = "_main";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    blocks: BTreeMap<String, Vec<Node>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding only a main block.
    pub fn from_main(nodes: Vec<Node>) -> Self {
        let mut script = Self::new();
        script.append(MAIN, nodes);
        script
    }

    pub fn main(&self) -> Option<&[Node]> {
        self.block(MAIN)
    }

    pub fn block(&self, id: &str) -> Option<&[Node]> {
        self.blocks.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Add `nodes` to the end of block `id`, creating it if needed.
    pub fn append(&mut self, id: impl Into<String>, nodes: Vec<Node>) {
        self.blocks.entry(id.into()).or_default().extend(nodes);
    }

    /// Union of both graphs; blocks present in both are concatenated, `self` first.
    #[must_use]
    pub fn merge(mut self, other: Script) -> Script {
        for (id, nodes) in other.blocks {
            self.append(id, nodes);
        }
        self
    }

    /// Move the main block under `id`. A graph without a main block gets an empty one.
    pub fn rename_main(&mut self, id: impl Into<String>) {
        let nodes = self.blocks.remove(MAIN).unwrap_or_default();
        self.append(id, nodes);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Node])> {
        self.blocks.iter().map(|(id, nodes)| (id.as_str(), nodes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Node>)> for Script {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Node>)>>(iter: I) -> Self {
        let mut script = Script::new();
        for (id, nodes) in iter {
            script.append(id, nodes);
        }
        script
    }
}
