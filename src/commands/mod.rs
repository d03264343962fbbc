//! CLI command implementations for herakles-dashboard.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: System and configuration validation
//! - `config`: Configuration file generation
//! - `plugins`: Plugin catalog listing per role
//! - `prune`: One-shot retention sweep
//! - `query`: Bucketed history as JSON

pub mod check;
pub mod config;
pub mod plugins;
pub mod prune;
pub mod query;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use plugins::command_plugins;
pub use prune::command_prune;
pub use query::command_query;
