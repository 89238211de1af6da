//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod diff;
mod typemap;
mod validate;

pub use diff::run_diff;
pub use typemap::{run_typemap, RemapArg, TypemapOptions};
pub use validate::run_validate;

// Re-export config types used by handlers
pub use crate::config::{DiffConfig, DiffPaths};
