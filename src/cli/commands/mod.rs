//! Command execution functions for each subcommand.

pub mod build;
pub mod compose;
pub mod patch;
