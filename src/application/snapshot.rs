//! File-backed execution graph snapshot
//!
//! A snapshot is a TOML document listing nodes with their parents:
//!
//! ```toml
//! heads = ["d"]
//!
//! [[nodes]]
//! id = "s"
//! kind = "region-start"
//!
//! [[nodes]]
//! id = "e"
//! kind = "region-end"
//! start = "s"
//! parents = ["s"]
//! ```
//!
//! Parsing enforces what the table builder relies on: known parents, known
//! region starts, and no cycles.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{ExecutionGraph, Role};

/// Identity of a snapshot node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Node kind as written in the snapshot file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    #[default]
    Plain,
    RegionStart,
    RegionEnd,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSnapshot {
    heads: Option<Vec<NodeId>>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    id: NodeId,
    label: Option<String>,
    status: Option<String>,
    #[serde(default)]
    parents: Vec<NodeId>,
    #[serde(default)]
    kind: NodeKind,
    start: Option<NodeId>,
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    pub id: NodeId,
    /// Display name, opaque to the table builder
    pub label: Option<String>,
    /// Execution status, opaque to the table builder
    pub status: Option<String>,
    pub parents: Vec<NodeId>,
    pub role: Role<NodeId>,
}

impl SnapshotNode {
    /// Label for display, falling back to the id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// Error parsing a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("invalid snapshot syntax: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("node {node} lists unknown parent {parent}")]
    UnknownParent { node: NodeId, parent: NodeId },

    #[error("unknown head: {0}")]
    UnknownHead(NodeId),

    #[error("region end {0} does not name its start")]
    MissingStart(NodeId),

    #[error("node {0} names a start but is not a region end")]
    UnexpectedStart(NodeId),

    #[error("region end {node} refers to unknown start {start}")]
    UnknownStart { node: NodeId, start: NodeId },

    #[error("cycle detected through node {0}")]
    Cycle(NodeId),
}

/// Execution graph loaded from a snapshot document.
#[derive(Debug, Clone, Default)]
pub struct SnapshotGraph {
    nodes: IndexMap<NodeId, SnapshotNode>,
    heads: Vec<NodeId>,
}

impl SnapshotGraph {
    /// Parse and validate a snapshot document.
    ///
    /// Without an explicit `heads` list, the heads are the nodes no other
    /// node lists as a parent, in file order.
    #[instrument(level = "debug", skip(content))]
    pub fn parse(content: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = toml::from_str(content)?;

        let mut nodes = IndexMap::with_capacity(raw.nodes.len());
        for node in raw.nodes {
            let role = match (node.kind, node.start) {
                (NodeKind::RegionEnd, Some(start)) => Role::RegionEnd { start },
                (NodeKind::RegionEnd, None) => return Err(SnapshotError::MissingStart(node.id)),
                (_, Some(_)) => return Err(SnapshotError::UnexpectedStart(node.id)),
                (NodeKind::RegionStart, None) => Role::RegionStart,
                (NodeKind::Plain, None) => Role::Plain,
            };
            if nodes.contains_key(&node.id) {
                return Err(SnapshotError::DuplicateNode(node.id));
            }
            nodes.insert(
                node.id.clone(),
                SnapshotNode {
                    id: node.id,
                    label: node.label,
                    status: node.status,
                    parents: node.parents,
                    role,
                },
            );
        }

        for node in nodes.values() {
            if let Some(parent) = node.parents.iter().find(|p| !nodes.contains_key(*p)) {
                return Err(SnapshotError::UnknownParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
            }
            if let Role::RegionEnd { start } = &node.role {
                if !nodes.contains_key(start) {
                    return Err(SnapshotError::UnknownStart {
                        node: node.id.clone(),
                        start: start.clone(),
                    });
                }
            }
        }

        let heads = match raw.heads {
            Some(heads) => {
                if let Some(unknown) = heads.iter().find(|h| !nodes.contains_key(*h)) {
                    return Err(SnapshotError::UnknownHead(unknown.clone()));
                }
                heads
            }
            None => terminal_nodes(&nodes),
        };

        check_acyclic(&nodes)?;

        debug!("parse: {} nodes, {} heads", nodes.len(), heads.len());
        Ok(Self { nodes, heads })
    }

    pub fn node(&self, id: &NodeId) -> Option<&SnapshotNode> {
        self.nodes.get(id)
    }

    pub fn heads(&self) -> &[NodeId] {
        &self.heads
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Display label of a node, falling back to the bare id for unknown nodes.
    pub fn label<'a>(&'a self, id: &'a NodeId) -> &'a str {
        self.node(id)
            .map(SnapshotNode::display_label)
            .unwrap_or_else(|| id.as_str())
    }
}

impl ExecutionGraph for SnapshotGraph {
    type Node = NodeId;

    fn current_heads(&self) -> Vec<NodeId> {
        self.heads.clone()
    }

    fn parents(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|n| n.parents.clone())
            .unwrap_or_default()
    }

    fn role(&self, node: &NodeId) -> Role<NodeId> {
        self.nodes
            .get(node)
            .map(|n| n.role.clone())
            .unwrap_or(Role::Plain)
    }
}

fn terminal_nodes(nodes: &IndexMap<NodeId, SnapshotNode>) -> Vec<NodeId> {
    let parents: HashSet<&NodeId> = nodes.values().flat_map(|n| n.parents.iter()).collect();
    nodes
        .keys()
        .filter(|id| !parents.contains(id))
        .cloned()
        .collect()
}

/// Kahn's algorithm over the parent links; whatever is never released sits
/// on or behind a cycle.
fn check_acyclic(nodes: &IndexMap<NodeId, SnapshotNode>) -> Result<(), SnapshotError> {
    let mut pending: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
    let mut children: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for node in nodes.values() {
        pending.insert(&node.id, node.parents.len());
        for parent in &node.parents {
            children.entry(parent).or_default().push(&node.id);
        }
    }

    let mut ready: VecDeque<&NodeId> = nodes
        .values()
        .filter(|n| n.parents.is_empty())
        .map(|n| &n.id)
        .collect();
    let mut released = 0;

    while let Some(id) = ready.pop_front() {
        released += 1;
        for &child in children.get(id).into_iter().flatten() {
            if let Some(count) = pending.get_mut(child) {
                *count -= 1;
                if *count == 0 {
                    ready.push_back(child);
                }
            }
        }
    }

    if released == nodes.len() {
        return Ok(());
    }
    let stuck = nodes
        .keys()
        .find(|id| pending.get(id).copied().unwrap_or(0) > 0)
        .cloned()
        .unwrap_or_else(|| NodeId::new("?"));
    Err(SnapshotError::Cycle(stuck))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORK: &str = r#"
heads = ["d"]

[[nodes]]
id = "s"
label = "parallel"
kind = "region-start"

[[nodes]]
id = "b1"
parents = ["s"]

[[nodes]]
id = "b2"
parents = ["s"]
status = "running"

[[nodes]]
id = "e"
kind = "region-end"
start = "s"
parents = ["b1", "b2"]

[[nodes]]
id = "d"
parents = ["e"]
"#;

    #[test]
    fn given_fork_snapshot_when_parsing_then_roles_and_heads() {
        let graph = SnapshotGraph::parse(FORK).unwrap();

        assert_eq!(graph.len(), 5);
        assert_eq!(graph.heads(), &[NodeId::from("d")]);
        assert_eq!(graph.role(&"s".into()), Role::RegionStart);
        assert_eq!(
            graph.role(&"e".into()),
            Role::RegionEnd { start: "s".into() }
        );
        assert_eq!(graph.parents(&"e".into()), vec!["b1".into(), "b2".into()]);
        assert_eq!(graph.label(&"s".into()), "parallel");
        assert_eq!(graph.label(&"b1".into()), "b1");
        assert_eq!(
            graph.node(&"b2".into()).unwrap().status.as_deref(),
            Some("running")
        );
    }

    #[test]
    fn given_no_heads_when_parsing_then_terminal_nodes_in_file_order() {
        let graph = SnapshotGraph::parse(
            r#"
[[nodes]]
id = "x"
[[nodes]]
id = "a"
[[nodes]]
id = "b"
parents = ["a"]
"#,
        )
        .unwrap();

        assert_eq!(graph.heads(), &[NodeId::from("x"), NodeId::from("b")]);
    }

    #[test]
    fn given_empty_document_when_parsing_then_empty_graph() {
        let graph = SnapshotGraph::parse("").unwrap();
        assert!(graph.is_empty());
        assert!(graph.heads().is_empty());
    }

    #[test]
    fn given_region_end_without_start_when_parsing_then_missing_start() {
        let err =
            SnapshotGraph::parse("[[nodes]]\nid = \"e\"\nkind = \"region-end\"\n").unwrap_err();
        assert!(matches!(err, SnapshotError::MissingStart(id) if id.as_str() == "e"));
    }

    #[test]
    fn given_start_on_plain_node_when_parsing_then_unexpected_start() {
        let err = SnapshotGraph::parse(
            "[[nodes]]\nid = \"s\"\n[[nodes]]\nid = \"p\"\nstart = \"s\"\nparents = [\"s\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::UnexpectedStart(id) if id.as_str() == "p"));
    }

    #[test]
    fn given_duplicate_id_when_parsing_then_duplicate_node() {
        let err =
            SnapshotGraph::parse("[[nodes]]\nid = \"a\"\n[[nodes]]\nid = \"a\"\n").unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateNode(_)));
    }

    #[test]
    fn given_unknown_parent_when_parsing_then_unknown_parent() {
        let err =
            SnapshotGraph::parse("[[nodes]]\nid = \"a\"\nparents = [\"ghost\"]\n").unwrap_err();
        assert!(
            matches!(err, SnapshotError::UnknownParent { parent, .. } if parent.as_str() == "ghost")
        );
    }

    #[test]
    fn given_unknown_head_when_parsing_then_unknown_head() {
        let err = SnapshotGraph::parse("heads = [\"zz\"]\n[[nodes]]\nid = \"a\"\n").unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownHead(_)));
    }

    #[test]
    fn given_cycle_when_parsing_then_cycle() {
        let err = SnapshotGraph::parse(
            r#"
heads = ["c"]
[[nodes]]
id = "root"
[[nodes]]
id = "a"
parents = ["root", "b"]
[[nodes]]
id = "b"
parents = ["a"]
[[nodes]]
id = "c"
parents = ["b"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Cycle(id) if id.as_str() == "a"));
    }

    #[test]
    fn given_unknown_field_when_parsing_then_syntax_error() {
        let err = SnapshotGraph::parse("[[nodes]]\nid = \"a\"\ncolour = \"red\"\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Syntax(_)));
    }
}
