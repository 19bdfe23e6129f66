//! Flow graph table service
//!
//! Loads snapshots through the filesystem boundary and turns them into
//! table rows and display lines.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{
    ApplicationError, ApplicationResult, IoResultExt, NodeId, SnapshotGraph,
};
use crate::domain::{FlowGraphTable, Row};
use crate::infrastructure::traits::FileSystem;

/// Display model for one row; formatting is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLine {
    pub id: NodeId,
    pub depth: usize,
    pub label: String,
    pub status: Option<String>,
    /// Label of the region end folded into this row
    pub paired_end: Option<String>,
    pub region_start: bool,
}

/// Counts describing one built table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    /// Nodes in the snapshot
    pub nodes: usize,
    pub heads: usize,
    /// Rows in the table, counting repeated merge points once per placement
    pub rows: usize,
    /// Distinct nodes shown as rows
    pub distinct_rows: usize,
    /// Region ends folded into their start row
    pub folded_ends: usize,
    /// Nodes not reachable from any head
    pub unreachable: usize,
    pub max_depth: usize,
}

/// Service for building flow graph tables from snapshots.
pub struct TableService {
    fs: Arc<dyn FileSystem>,
}

impl TableService {
    /// Create a new table service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load and validate a snapshot file.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<SnapshotGraph> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::SnapshotNotFound(path.to_path_buf()));
        }
        if !self.fs.is_file(path) {
            return Err(ApplicationError::NotAFile(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read snapshot", path)?;
        let graph = SnapshotGraph::parse(&content).map_err(|source| ApplicationError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("load: {} nodes from {}", graph.len(), path.display());
        Ok(graph)
    }

    /// Build the table rows for a snapshot.
    #[instrument(level = "debug", skip_all)]
    pub fn build(&self, graph: &SnapshotGraph) -> ApplicationResult<Vec<Row<NodeId>>> {
        let mut table = FlowGraphTable::new(graph);
        let rows = table.build()?.to_vec();
        debug!("build: {} rows", rows.len());
        Ok(rows)
    }

    /// Attach the snapshot's payloads to each row.
    pub fn lines(&self, graph: &SnapshotGraph, rows: &[Row<NodeId>]) -> Vec<TableLine> {
        rows.iter()
            .map(|row| {
                let node = graph.node(row.node());
                TableLine {
                    id: row.node().clone(),
                    depth: row.depth(),
                    label: graph.label(row.node()).to_string(),
                    status: node.and_then(|n| n.status.clone()),
                    paired_end: row.paired_end().map(|end| graph.label(end).to_string()),
                    region_start: row.is_region_start(),
                }
            })
            .collect()
    }

    pub fn summary(&self, graph: &SnapshotGraph, rows: &[Row<NodeId>]) -> TableSummary {
        let distinct: HashSet<&NodeId> = rows.iter().map(|row| row.node()).collect();
        let folded: HashSet<&NodeId> = rows.iter().filter_map(|row| row.paired_end()).collect();
        let reachable = distinct.len() + folded.len();

        TableSummary {
            nodes: graph.len(),
            heads: graph.heads().len(),
            rows: rows.len(),
            distinct_rows: distinct.len(),
            folded_ends: folded.len(),
            unreachable: graph.len().saturating_sub(reachable),
            max_depth: rows.iter().map(Row::depth).max().unwrap_or(0),
        }
    }
}
