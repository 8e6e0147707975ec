//! Command-line interface for statpack.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, LastArgs, ProvisionArgs};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
