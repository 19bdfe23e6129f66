//! In-memory graph for domain unit tests.

use std::collections::HashMap;

use crate::domain::graph::{ExecutionGraph, Role};

#[derive(Debug, Default)]
pub struct FakeGraph {
    heads: Vec<&'static str>,
    nodes: HashMap<&'static str, (Vec<&'static str>, Role<&'static str>)>,
}

impl FakeGraph {
    pub fn new(heads: &[&'static str]) -> Self {
        Self {
            heads: heads.to_vec(),
            nodes: HashMap::new(),
        }
    }

    pub fn plain(self, id: &'static str, parents: &[&'static str]) -> Self {
        self.node(id, parents, Role::Plain)
    }

    pub fn start(self, id: &'static str, parents: &[&'static str]) -> Self {
        self.node(id, parents, Role::RegionStart)
    }

    pub fn end(self, id: &'static str, start: &'static str, parents: &[&'static str]) -> Self {
        self.node(id, parents, Role::RegionEnd { start })
    }

    fn node(
        mut self,
        id: &'static str,
        parents: &[&'static str],
        role: Role<&'static str>,
    ) -> Self {
        self.nodes.insert(id, (parents.to_vec(), role));
        self
    }
}

impl ExecutionGraph for FakeGraph {
    type Node = &'static str;

    fn current_heads(&self) -> Vec<Self::Node> {
        self.heads.clone()
    }

    fn parents(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.nodes
            .get(node)
            .map(|(parents, _)| parents.clone())
            .unwrap_or_default()
    }

    fn role(&self, node: &Self::Node) -> Role<Self::Node> {
        self.nodes
            .get(node)
            .map(|(_, role)| role.clone())
            .unwrap_or(Role::Plain)
    }
}
