//! Tooling & Integration Layer
//!
//! Command-line access to resource sets: load documents, list their objects,
//! resolve hrefs.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
