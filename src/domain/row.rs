//! Public, immutable view of one table row.

use crate::domain::graph::Role;

/// One line of the flow graph table.
///
/// A region start and its end collapse into a single row: `node` is the start
/// and `paired_end` the end. Region ends never appear as rows of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row<N> {
    node: N,
    role: Role<N>,
    paired_end: Option<N>,
    depth: usize,
}

impl<N> Row<N> {
    pub(crate) fn new(node: N, role: Role<N>, paired_end: Option<N>, depth: usize) -> Self {
        Self {
            node,
            role,
            paired_end,
            depth,
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn role(&self) -> &Role<N> {
        &self.role
    }

    /// End of the region this row opens, if the end has been reached.
    pub fn paired_end(&self) -> Option<&N> {
        self.paired_end.as_ref()
    }

    /// Indentation level; 0 for the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_region_start(&self) -> bool {
        self.role.is_region_start()
    }
}
