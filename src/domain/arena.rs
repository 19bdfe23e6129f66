use std::hash::Hash;

use generational_arena::{Arena, Index};
use indexmap::{IndexMap, IndexSet};
use tracing::instrument;

use crate::domain::error::{describe, DomainError, DomainResult};
use crate::domain::graph::Role;

/// Working state for one node while the table is being built.
#[derive(Debug)]
pub struct RowSlot<N> {
    /// Node wrapped by this row
    pub node: N,
    /// Role read from the graph when the row was created
    pub role: Role<N>,
    /// Parents read from the graph when the row was created
    pub parents: Vec<N>,
    /// Row of the paired region end, only on region starts
    pub paired_end: Option<Index>,
    /// Row of the paired region start, only on region ends
    pub paired_start: Option<Index>,
    /// Rows whose node lists this row's node as a parent
    pub graph_children: IndexSet<Index>,
    /// Nested rows, rendered one level deeper
    pub tree_children: IndexSet<Index>,
    /// Rows that continue after this one at the same level
    pub tree_siblings: IndexSet<Index>,
    /// Display depth, None until depths are assigned
    pub depth: Option<usize>,
}

impl<N> RowSlot<N> {
    fn new(node: N, role: Role<N>, parents: Vec<N>) -> Self {
        Self {
            node,
            role,
            parents,
            paired_end: None,
            paired_start: None,
            graph_children: IndexSet::new(),
            tree_children: IndexSet::new(),
            tree_siblings: IndexSet::new(),
            depth: None,
        }
    }
}

/// Arena of rows, one per reachable node.
///
/// Rows are addressed by generational index; the node lookup keeps
/// discovery order, which every later stage iterates in.
#[derive(Debug)]
pub struct RowArena<N> {
    arena: Arena<RowSlot<N>>,
    by_node: IndexMap<N, Index>,
}

impl<N: Clone + Eq + Hash> Default for RowArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone + Eq + Hash> RowArena<N> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_node: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn contains(&self, node: &N) -> bool {
        self.by_node.contains_key(node)
    }

    /// Inserts a row for `node`; a node that already has a row keeps it.
    pub fn insert(&mut self, node: N, role: Role<N>, parents: Vec<N>) -> Index {
        if let Some(&idx) = self.by_node.get(&node) {
            return idx;
        }
        let idx = self.arena.insert(RowSlot::new(node.clone(), role, parents));
        self.by_node.insert(node, idx);
        idx
    }

    pub fn index_of(&self, node: &N) -> Option<Index> {
        self.by_node.get(node).copied()
    }

    pub fn get(&self, idx: Index) -> Option<&RowSlot<N>> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut RowSlot<N>> {
        self.arena.get_mut(idx)
    }

    /// Row indices in discovery order.
    pub fn order(&self) -> Vec<Index> {
        self.by_node.values().copied().collect()
    }

    /// Rows in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, &RowSlot<N>)> + '_ {
        self.by_node
            .values()
            .filter_map(move |&idx| self.arena.get(idx).map(|slot| (idx, slot)))
    }

    fn is_region_end(&self, idx: Index) -> bool {
        self.arena
            .get(idx)
            .map(|slot| slot.role.is_region_end())
            .unwrap_or(false)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn add_graph_child(&mut self, parent: Index, child: Index) {
        if let Some(slot) = self.arena.get_mut(parent) {
            slot.graph_children.insert(child);
        }
    }

    /// Nests `child` under `parent`. Region ends never enter the tree.
    #[instrument(level = "trace", skip(self))]
    pub fn add_tree_child(&mut self, parent: Index, child: Index) {
        if self.is_region_end(child) {
            return;
        }
        if let Some(slot) = self.arena.get_mut(parent) {
            slot.tree_children.insert(child);
        }
    }

    /// Continues `row` with `sibling` at the same level. Region ends never
    /// enter the tree.
    #[instrument(level = "trace", skip(self))]
    pub fn add_tree_sibling(&mut self, row: Index, sibling: Index) {
        if self.is_region_end(sibling) {
            return;
        }
        if let Some(slot) = self.arena.get_mut(row) {
            slot.tree_siblings.insert(sibling);
        }
    }
}

impl<N: Clone + Eq + Hash + std::fmt::Debug> RowArena<N> {
    /// Records the 1:1 pairing between a region start and its end.
    ///
    /// A start that already has a different end is left untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn pair(&mut self, start: Index, end: Index) -> DomainResult<()> {
        let existing = self
            .arena
            .get(start)
            .ok_or_else(|| DomainError::UnreachableRow(self.node_label(start)))?
            .paired_end;
        if let Some(existing) = existing.filter(|&existing| existing != end) {
            return Err(DomainError::DuplicatePairing {
                start: self.node_label(start),
                existing: self.node_label(existing),
                end: self.node_label(end),
            });
        }
        if let Some(start_slot) = self.arena.get_mut(start) {
            start_slot.paired_end = Some(end);
        }
        if let Some(end_slot) = self.arena.get_mut(end) {
            end_slot.paired_start = Some(start);
        }
        Ok(())
    }

    pub(crate) fn node_label(&self, idx: Index) -> String {
        self.arena
            .get(idx)
            .map(|slot| describe(&slot.node))
            .unwrap_or_else(|| format!("{:?}", idx))
    }
}
