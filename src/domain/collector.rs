//! Discovery of every node reachable from the current heads.

use tracing::{debug, instrument};

use crate::domain::arena::RowArena;
use crate::domain::graph::ExecutionGraph;

/// Creates one row per node reachable from the graph's current heads.
///
/// Walks parent links depth-first with an explicit stack. The stack starts
/// with the heads in order and always pops the most recently pushed node,
/// so the last head is discovered first. Rows keep discovery order, which
/// decides the canonical root later on.
///
/// Each node's role and parents are read exactly once and cached in its row.
#[instrument(level = "debug", skip_all)]
pub fn collect_rows<G: ExecutionGraph>(graph: &G) -> RowArena<G::Node> {
    let mut rows = RowArena::new();
    let mut stack = graph.current_heads();
    debug!("collect_rows: {} heads", stack.len());

    while let Some(node) = stack.pop() {
        if rows.contains(&node) {
            continue;
        }
        let role = graph.role(&node);
        let parents = graph.parents(&node);
        stack.extend(parents.iter().cloned());
        rows.insert(node, role, parents);
    }

    debug!("collect_rows: {} reachable nodes", rows.len());
    rows
}
