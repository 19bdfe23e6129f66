//! Domain layer: the graph-to-table transformation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod collector;
pub mod depth;
pub mod error;
pub mod forward;
pub mod graph;
pub mod linearize;
pub mod row;
pub mod shaper;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::{RowArena, RowSlot};
pub use error::{DomainError, DomainResult};
pub use graph::{ExecutionGraph, Role};
pub use row::Row;
pub use table::{build_rows, FlowGraphTable};
