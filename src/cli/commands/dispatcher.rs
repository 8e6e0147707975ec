//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_params, SetParams};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Project root used for config discovery.
    pub project_root: PathBuf,
    /// Explicit config file (`--config`).
    pub config_path: Option<PathBuf>,
    /// `--debug` was given.
    pub debug: bool,
    /// Styled output.
    pub colors: bool,
}

impl CommandContext {
    /// Context for `project_root` with defaults for everything else.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    /// Resolve parameters from config file, environment and `args`.
    pub fn resolve(&self, args: SetParams) -> Result<SetParams> {
        load_params(&self.project_root, self.config_path.as_deref(), args)
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.context.project_root
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Provision(args) => {
                let cmd = super::provision::ProvisionCommand::new(&self.context, args.clone());
                cmd.execute(ui)
            }
            Commands::Check(args) => {
                let cmd = super::check::CheckCommand::new(&self.context, args.clone());
                cmd.execute(ui)
            }
            Commands::Last(args) => {
                let cmd = super::last::LastCommand::new(&self.context, args.clone());
                cmd.execute(ui)
            }
        }
    }
}
