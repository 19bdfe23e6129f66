//! Display depth of every row in the tree.

use std::fmt::Debug;
use std::hash::Hash;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::RowArena;
use crate::domain::error::{describe, DomainError, DomainResult};

/// Assigns each row its indentation level, starting with 0 at `root`.
///
/// Tree children sit one level deeper than their parent, tree siblings at the
/// level of the row they continue. The walk uses an explicit stack in
/// pre-order, so a row placed more than once keeps the depth of its first
/// placement and is not walked again.
///
/// Every row except region ends must end up with a depth.
#[instrument(level = "debug", skip_all)]
pub fn assign_depths<N>(rows: &mut RowArena<N>, root: Index) -> DomainResult<()>
where
    N: Clone + Eq + Hash + Debug,
{
    let mut stack: Vec<(Index, usize)> = vec![(root, 0)];
    let mut max_depth = 0;

    while let Some((idx, depth)) = stack.pop() {
        let Some(slot) = rows.get_mut(idx) else {
            continue;
        };
        if slot.depth.is_some() {
            continue;
        }
        slot.depth = Some(depth);
        max_depth = max_depth.max(depth);

        // siblings wait until the children's subtrees are done
        stack.extend(slot.tree_siblings.iter().rev().map(|&s| (s, depth)));
        stack.extend(slot.tree_children.iter().rev().map(|&c| (c, depth + 1)));
    }

    if let Some((_, slot)) = rows
        .iter()
        .find(|(_, slot)| slot.depth.is_none() && !slot.role.is_region_end())
    {
        return Err(DomainError::UnreachableRow(describe(&slot.node)));
    }

    debug!("assign_depths: max depth {}", max_depth);
    Ok(())
}
