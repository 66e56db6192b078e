//! Tooling & Integration Layer
//!
//! The command-line surface over the catalog library.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
