//! CLI subcommand implementations.

pub mod admin;
pub mod sql;
