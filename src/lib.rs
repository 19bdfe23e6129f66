//! flowtable: turn an execution flow graph into an indented table of rows.
//!
//! The core transformation lives in [`domain`] and works on any
//! [`domain::ExecutionGraph`]. The remaining layers load TOML snapshots,
//! layer configuration and drive the command line.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
