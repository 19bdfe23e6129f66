//! The execution graph as seen by the table builder.

use std::fmt::Debug;
use std::hash::Hash;

/// Role of a node in the execution graph.
///
/// A region end carries the identity of the region start it closes, so the
/// start/end pairing is always available together with the role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role<N> {
    Plain,
    RegionStart,
    RegionEnd { start: N },
}

impl<N> Role<N> {
    pub fn is_region_start(&self) -> bool {
        matches!(self, Role::RegionStart)
    }

    pub fn is_region_end(&self) -> bool {
        matches!(self, Role::RegionEnd { .. })
    }

    /// Paired start of a region end, `None` for every other role.
    pub fn paired_start(&self) -> Option<&N> {
        match self {
            Role::RegionEnd { start } => Some(start),
            Role::Plain | Role::RegionStart => None,
        }
    }
}

/// Read-only access to a recorded execution.
///
/// Nodes only link back to their predecessors. Implementations must be
/// append-only: once a node has been published, its parents and role never
/// change, so reading them twice during one build yields the same answer.
pub trait ExecutionGraph {
    /// Node identity. Two handles to the same step compare equal.
    type Node: Clone + Eq + Hash + Debug;

    /// Terminal nodes of the graph at the time of the call.
    fn current_heads(&self) -> Vec<Self::Node>;

    /// Direct predecessors of `node`, in order.
    fn parents(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn role(&self, node: &Self::Node) -> Role<Self::Node>;
}

impl<G: ExecutionGraph + ?Sized> ExecutionGraph for &G {
    type Node = G::Node;

    fn current_heads(&self) -> Vec<Self::Node> {
        (**self).current_heads()
    }

    fn parents(&self, node: &Self::Node) -> Vec<Self::Node> {
        (**self).parents(node)
    }

    fn role(&self, node: &Self::Node) -> Role<Self::Node> {
        (**self).role(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_region_end_when_asking_paired_start_then_returns_start() {
        let role = Role::RegionEnd { start: "s" };
        assert!(role.is_region_end());
        assert!(!role.is_region_start());
        assert_eq!(role.paired_start(), Some(&"s"));
    }

    #[test]
    fn given_plain_or_start_when_asking_paired_start_then_none() {
        assert_eq!(Role::<&str>::Plain.paired_start(), None);
        assert_eq!(Role::<&str>::RegionStart.paired_start(), None);
        assert!(Role::<&str>::RegionStart.is_region_start());
    }
}
