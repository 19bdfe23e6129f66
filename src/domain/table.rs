//! Tabular view of an execution graph.

use tracing::{debug, instrument};

use crate::domain::collector::collect_rows;
use crate::domain::depth::assign_depths;
use crate::domain::error::DomainResult;
use crate::domain::forward::build_forward_edges;
use crate::domain::graph::ExecutionGraph;
use crate::domain::linearize::linearize;
use crate::domain::row::Row;
use crate::domain::shaper::shape_tree;

/// Data model behind the tree list view of an execution graph.
///
/// Rows are recomputed from scratch on every [`build`](Self::build) and are
/// not available before the first successful one.
#[derive(Debug)]
pub struct FlowGraphTable<'g, G: ExecutionGraph> {
    graph: &'g G,
    rows: Option<Vec<Row<G::Node>>>,
}

impl<'g, G: ExecutionGraph> FlowGraphTable<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph, rows: None }
    }

    /// Builds the rows from the graph as it is right now.
    ///
    /// On failure no rows are exposed, not even those of an earlier build.
    pub fn build(&mut self) -> DomainResult<&[Row<G::Node>]> {
        self.rows = None;
        let rows = build_rows(self.graph)?;
        Ok(self.rows.insert(rows).as_slice())
    }

    pub fn rows(&self) -> Option<&[Row<G::Node>]> {
        self.rows.as_deref()
    }
}

/// Runs the whole transformation once: collect, link forward, shape,
/// assign depths, linearize.
#[instrument(level = "debug", skip_all)]
pub fn build_rows<G: ExecutionGraph>(graph: &G) -> DomainResult<Vec<Row<G::Node>>> {
    let mut rows = collect_rows(graph);
    let Some(roots) = build_forward_edges(&mut rows)? else {
        debug!("build_rows: empty graph");
        return Ok(Vec::new());
    };
    shape_tree(&mut rows, &roots);
    assign_depths(&mut rows, roots.root)?;
    Ok(linearize(&rows, roots.root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::graph::Role;
    use crate::domain::testing::FakeGraph;
    use std::cell::Cell;

    fn nodes(rows: &[Row<&'static str>]) -> Vec<&'static str> {
        rows.iter().map(|row| *row.node()).collect()
    }

    #[test]
    fn given_new_table_then_no_rows_until_built() {
        let graph = FakeGraph::new(&["a"]).plain("a", &[]);
        let mut table = FlowGraphTable::new(&graph);
        assert!(table.rows().is_none());

        table.build().unwrap();

        assert_eq!(nodes(table.rows().unwrap()), vec!["a"]);
    }

    #[test]
    fn given_same_snapshot_when_building_twice_then_identical_rows() {
        let graph = FakeGraph::new(&["d"])
            .start("s", &[])
            .plain("b1", &["s"])
            .plain("b2", &["s"])
            .end("e", "s", &["b1", "b2"])
            .plain("d", &["e"]);
        let mut table = FlowGraphTable::new(&graph);

        let first = table.build().unwrap().to_vec();
        let second = table.build().unwrap().to_vec();

        assert_eq!(first, second);
    }

    #[test]
    fn given_failing_build_then_previous_rows_dropped() {
        // healthy on the first build, a cycle without a parentless node on the second
        struct Degrading(Cell<bool>);

        impl ExecutionGraph for Degrading {
            type Node = &'static str;

            fn current_heads(&self) -> Vec<&'static str> {
                vec!["a"]
            }

            fn parents(&self, node: &&'static str) -> Vec<&'static str> {
                match (self.0.get(), *node) {
                    (true, "a") => vec!["b"],
                    (true, "b") => vec!["a"],
                    _ => vec![],
                }
            }

            fn role(&self, _node: &&'static str) -> Role<&'static str> {
                Role::Plain
            }
        }

        let graph = Degrading(Cell::new(false));
        let mut table = FlowGraphTable::new(&graph);
        table.build().unwrap();
        assert!(table.rows().is_some());
        graph.0.set(true);

        assert_eq!(table.build().unwrap_err(), DomainError::MissingRoot(2));
        assert!(table.rows().is_none());
    }

    // Plain merges are not collapsed: the merge point is placed under each
    // predecessor and listed once per placement.
    #[test]
    fn given_plain_merge_when_building_then_merge_point_listed_per_predecessor() {
        let graph = FakeGraph::new(&["m"])
            .start("s", &[])
            .plain("b1", &["s"])
            .plain("b2", &["s"])
            .plain("m", &["b1", "b2"]);

        let rows = build_rows(&graph).unwrap();

        let listed: Vec<_> = rows.iter().map(|row| (*row.node(), row.depth())).collect();
        assert_eq!(
            listed,
            vec![("s", 0), ("b2", 1), ("m", 1), ("b1", 1), ("m", 1)]
        );
    }

    #[test]
    fn given_parentless_region_end_when_building_then_folded_into_start() {
        let graph = FakeGraph::new(&["s", "e"]).start("s", &[]).end("e", "s", &[]);

        let rows = build_rows(&graph).unwrap();

        assert_eq!(nodes(&rows), vec!["s"]);
        assert_eq!(rows[0].paired_end(), Some(&"e"));
        assert!(rows.iter().all(|row| !row.role().is_region_end()));
    }

    #[test]
    fn given_deep_chain_when_building_then_no_stack_overflow() {
        struct Chain(u32);

        impl ExecutionGraph for Chain {
            type Node = u32;

            fn current_heads(&self) -> Vec<u32> {
                vec![self.0 - 1]
            }

            fn parents(&self, node: &u32) -> Vec<u32> {
                if *node == 0 {
                    vec![]
                } else {
                    vec![node - 1]
                }
            }

            fn role(&self, _node: &u32) -> Role<u32> {
                Role::Plain
            }
        }

        let rows = build_rows(&Chain(100_000)).unwrap();

        assert_eq!(rows.len(), 100_000);
        assert_eq!(*rows[0].node(), 0);
        assert_eq!(*rows[99_999].node(), 99_999);
        assert!(rows.iter().all(|row| row.depth() == 0));
    }
}
