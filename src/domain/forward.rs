//! Forward (child) edges from the graph's parent links.

use std::fmt::Debug;
use std::hash::Hash;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::RowArena;
use crate::domain::error::{describe, DomainError, DomainResult};

/// Anchor of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// First parentless row in discovery order that is not a region end
    pub root: Index,
    /// Other parentless rows except region ends, in discovery order; they
    /// continue after the root
    pub head_siblings: Vec<Index>,
}

/// Inverts parent links into `graph_children`, picks the canonical root and
/// pairs every region end with its start.
///
/// The root is the first parentless row in discovery order that is not a
/// region end. Returns `None` for an empty arena.
#[instrument(level = "debug", skip_all)]
pub fn build_forward_edges<N>(rows: &mut RowArena<N>) -> DomainResult<Option<Roots>>
where
    N: Clone + Eq + Hash + Debug,
{
    if rows.is_empty() {
        return Ok(None);
    }

    let mut root: Option<Index> = None;
    let mut head_siblings = Vec::new();

    for idx in rows.order() {
        let Some(slot) = rows.get(idx) else {
            continue;
        };
        let node = slot.node.clone();
        let parents = slot.parents.clone();
        let role = slot.role.clone();

        for parent in &parents {
            let parent_idx = rows
                .index_of(parent)
                .ok_or_else(|| DomainError::UnknownParent {
                    node: describe(&node),
                    parent: describe(parent),
                })?;
            rows.add_graph_child(parent_idx, idx);
        }

        // a parentless region end is folded into its start, never anchored
        if parents.is_empty() && !role.is_region_end() {
            match root {
                None => root = Some(idx),
                // several independent heads are flattened into one sibling chain
                Some(_) => head_siblings.push(idx),
            }
        }

        if let Some(start) = role.paired_start() {
            let start_idx = rows
                .index_of(start)
                .ok_or_else(|| DomainError::UnresolvedStart {
                    end: describe(&node),
                    start: describe(start),
                })?;
            let start_is_region = rows
                .get(start_idx)
                .map(|slot| slot.role.is_region_start())
                .unwrap_or(false);
            if !start_is_region {
                return Err(DomainError::NotARegionStart {
                    end: describe(&node),
                    start: describe(start),
                });
            }
            rows.pair(start_idx, idx)?;
        }
    }

    let root = root.ok_or(DomainError::MissingRoot(rows.len()))?;
    debug!(
        "build_forward_edges: root {}, {} extra heads",
        rows.node_label(root),
        head_siblings.len()
    );
    Ok(Some(Roots {
        root,
        head_siblings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collector::collect_rows;
    use crate::domain::testing::FakeGraph;

    fn children(rows: &RowArena<&'static str>, node: &'static str) -> Vec<&'static str> {
        let idx = rows.index_of(&node).unwrap();
        rows.get(idx)
            .unwrap()
            .graph_children
            .iter()
            .map(|&c| rows.get(c).unwrap().node)
            .collect()
    }

    #[test]
    fn given_parentless_region_end_when_building_then_never_root_or_head_sibling() {
        // e is discovered first but must not anchor the tree
        let graph = FakeGraph::new(&["s", "e"]).start("s", &[]).end("e", "s", &[]);
        let mut rows = collect_rows(&graph);

        let roots = build_forward_edges(&mut rows).unwrap().unwrap();

        assert_eq!(rows.get(roots.root).unwrap().node, "s");
        assert!(roots.head_siblings.is_empty());
    }

    #[test]
    fn given_only_region_ends_parentless_when_building_then_missing_root() {
        let graph = FakeGraph::new(&["s"]).end("e", "s", &[]).start("s", &["e"]);
        let mut rows = collect_rows(&graph);

        let err = build_forward_edges(&mut rows).unwrap_err();

        assert_eq!(err, DomainError::MissingRoot(2));
    }

    #[test]
    fn given_empty_arena_when_building_then_none() {
        let mut rows = RowArena::<&'static str>::new();
        assert_eq!(build_forward_edges(&mut rows).unwrap(), None);
    }

    #[test]
    fn given_fork_when_building_then_children_and_pairing() {
        let graph = FakeGraph::new(&["d"])
            .start("s", &[])
            .plain("b1", &["s"])
            .plain("b2", &["s"])
            .end("e", "s", &["b1", "b2"])
            .plain("d", &["e"]);
        let mut rows = collect_rows(&graph);

        let roots = build_forward_edges(&mut rows).unwrap().unwrap();

        assert_eq!(rows.get(roots.root).unwrap().node, "s");
        assert!(roots.head_siblings.is_empty());
        // discovery order is d, e, b2, s, b1
        assert_eq!(children(&rows, "s"), vec!["b2", "b1"]);
        assert_eq!(children(&rows, "e"), vec!["d"]);

        let s = rows.index_of(&"s").unwrap();
        let e = rows.index_of(&"e").unwrap();
        assert_eq!(rows.get(s).unwrap().paired_end, Some(e));
        assert_eq!(rows.get(e).unwrap().paired_start, Some(s));
    }

    #[test]
    fn given_two_heads_when_building_then_second_is_head_sibling() {
        let graph = FakeGraph::new(&["x", "y"]).plain("x", &[]).plain("y", &[]);
        let mut rows = collect_rows(&graph);

        let roots = build_forward_edges(&mut rows).unwrap().unwrap();

        assert_eq!(rows.get(roots.root).unwrap().node, "y");
        assert_eq!(roots.head_siblings.len(), 1);
        assert_eq!(rows.get(roots.head_siblings[0]).unwrap().node, "x");
    }

    #[test]
    fn given_two_ends_for_one_start_when_building_then_duplicate_pairing() {
        let graph = FakeGraph::new(&["e2"])
            .start("s", &[])
            .end("e1", "s", &["s"])
            .end("e2", "s", &["e1"]);
        let mut rows = collect_rows(&graph);

        let err = build_forward_edges(&mut rows).unwrap_err();

        assert!(matches!(err, DomainError::DuplicatePairing { .. }));
        assert!(err.is_consistency_violation());
    }

    #[test]
    fn given_end_paired_with_plain_node_when_building_then_not_a_region_start() {
        let graph = FakeGraph::new(&["e"]).plain("a", &[]).end("e", "a", &["a"]);
        let mut rows = collect_rows(&graph);

        let err = build_forward_edges(&mut rows).unwrap_err();

        assert!(matches!(err, DomainError::NotARegionStart { .. }));
    }

    #[test]
    fn given_end_with_unreachable_start_when_building_then_unresolved_start() {
        let graph = FakeGraph::new(&["e"])
            .plain("a", &[])
            .start("elsewhere", &[])
            .end("e", "elsewhere", &["a"]);
        let mut rows = collect_rows(&graph);

        let err = build_forward_edges(&mut rows).unwrap_err();

        assert_eq!(
            err,
            DomainError::UnresolvedStart {
                end: "\"e\"".to_string(),
                start: "\"elsewhere\"".to_string(),
            }
        );
    }

    #[test]
    fn given_cycle_without_parentless_node_when_building_then_missing_root() {
        let graph = FakeGraph::new(&["a"]).plain("a", &["b"]).plain("b", &["a"]);
        let mut rows = collect_rows(&graph);

        let err = build_forward_edges(&mut rows).unwrap_err();

        assert_eq!(err, DomainError::MissingRoot(2));
        assert!(!err.is_consistency_violation());
    }
}
