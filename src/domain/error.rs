//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors signal a graph that breaks the builder's input contract.
///
/// Node identities are captured with their `Debug` rendering so the error
/// type stays independent of the graph's node type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("region start {start} is already paired with end {existing}, cannot pair it with {end}")]
    DuplicatePairing {
        start: String,
        existing: String,
        end: String,
    },

    #[error("region end {end} refers to start {start}, which is not reachable")]
    UnresolvedStart { end: String, start: String },

    #[error("region end {end} refers to {start}, which is not a region start")]
    NotARegionStart { end: String, start: String },

    #[error("parent {parent} of {node} is not reachable")]
    UnknownParent { node: String, parent: String },

    #[error("row {0} is not reachable from the root of the tree")]
    UnreachableRow(String),

    #[error("no parentless node among {0} reachable nodes")]
    MissingRoot(usize),
}

impl DomainError {
    /// Whether the error breaks the 1:1 region pairing or the reachability
    /// guarantees of the graph, as opposed to lacking a root altogether.
    pub fn is_consistency_violation(&self) -> bool {
        !matches!(self, DomainError::MissingRoot(_))
    }
}

/// Result type for table operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Debug rendering of a node identity for error messages.
pub(crate) fn describe<N: std::fmt::Debug>(node: &N) -> String {
    format!("{:?}", node)
}
