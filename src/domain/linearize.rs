//! Flattens the tree into the final row order.

use std::fmt::Debug;
use std::hash::Hash;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::RowArena;
use crate::domain::row::Row;

/// Orders the tree under `root` into a sequence of rows.
///
/// Pre-order with an explicit stack: a row is followed by its tree children
/// (each with its own subtree), then by its tree siblings (each with its own
/// subtree). Siblings that are still pending wait on the stack while the
/// children are visited, so a row always precedes everything nested under
/// it. Region ends are never part of the tree and so never emitted.
#[instrument(level = "debug", skip_all)]
pub fn linearize<N>(rows: &RowArena<N>, root: Index) -> Vec<Row<N>>
where
    N: Clone + Eq + Hash + Debug,
{
    let mut ordered = Vec::with_capacity(rows.len());
    let mut pending: Vec<Index> = vec![root];

    while let Some(idx) = pending.pop() {
        let Some(slot) = rows.get(idx) else {
            continue;
        };

        let paired_end = slot
            .paired_end
            .and_then(|end| rows.get(end))
            .map(|end| end.node.clone());
        ordered.push(Row::new(
            slot.node.clone(),
            slot.role.clone(),
            paired_end,
            slot.depth.unwrap_or(0),
        ));

        pending.extend(slot.tree_siblings.iter().rev());
        pending.extend(slot.tree_children.iter().rev());
    }

    debug!("linearize: {} rows", ordered.len());
    ordered
}
