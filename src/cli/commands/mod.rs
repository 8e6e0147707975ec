//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`].

pub mod check;
pub mod dispatcher;
pub mod display;
pub mod last;
pub mod provision;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
