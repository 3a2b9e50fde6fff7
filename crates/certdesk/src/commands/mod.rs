//! CLI command handlers.

pub mod serve;
