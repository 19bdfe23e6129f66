//! Turns forward graph edges into tree children and tree siblings.

use std::hash::Hash;

use tracing::{instrument, trace};

use crate::domain::arena::RowArena;
use crate::domain::forward::Roots;
use crate::domain::graph::Role;

/// Places every row's graph children into the tree.
///
/// In the graph a parent is a predecessor: if step A runs and then step B,
/// A is B's parent. In the table B continues after A at the same level, so
/// graph children become tree siblings. Region starts nest their graph
/// children instead (a fork shows its branches one level deeper). Region ends
/// are folded into their start: their graph children continue after the
/// start, and the end itself never enters the tree.
///
/// A plain node reached from several predecessors is placed under each of
/// them.
#[instrument(level = "debug", skip_all)]
pub fn shape_tree<N: Clone + Eq + Hash>(rows: &mut RowArena<N>, roots: &Roots) {
    for idx in rows.order() {
        let Some(slot) = rows.get(idx) else {
            continue;
        };
        let children: Vec<_> = slot.graph_children.iter().copied().collect();
        let role = slot.role.clone();
        let paired_start = slot.paired_start;

        match role {
            Role::RegionStart => {
                for child in children {
                    rows.add_tree_child(idx, child);
                }
            }
            Role::RegionEnd { .. } => {
                // continue after the start; forward edges have paired every end
                let Some(start) = paired_start else {
                    continue;
                };
                for child in children {
                    rows.add_tree_sibling(start, child);
                }
            }
            Role::Plain => {
                for child in children {
                    rows.add_tree_sibling(idx, child);
                }
            }
        }
    }

    for &sibling in &roots.head_siblings {
        trace!("shape_tree: chaining extra head after root");
        rows.add_tree_sibling(roots.root, sibling);
    }
}
