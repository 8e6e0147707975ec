//! Last command implementation.
//!
//! The `statpack last` command shows the most recent provisioning run
//! recorded under the project data folder.

use crate::cli::args::LastArgs;
use crate::config::SetParams;
use crate::error::{Result, StatpackError};
use crate::state::HistoryStore;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};
use super::display;

/// The last command implementation.
pub struct LastCommand {
    context: CommandContext,
    args: LastArgs,
}

impl LastCommand {
    /// Create a new last command.
    pub fn new(context: &CommandContext, args: LastArgs) -> Self {
        Self {
            context: context.clone(),
            args,
        }
    }
}

impl Command for LastCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let explicit = SetParams {
            project_data_folder: self.args.project_data.clone(),
            ..Default::default()
        };
        let (config, _) = self.context.resolve(explicit)?.build()?;
        let folder = config.project_data_folder.ok_or_else(|| {
            StatpackError::configuration("project data folder is not configured")
        })?;

        let Some(record) = HistoryStore::for_project(&folder).load()? else {
            ui.message("No runs recorded for this project.");
            return Ok(CommandResult::success());
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| StatpackError::Other(e.into()))?;
            ui.message(&json);
        } else {
            display::show_record(ui, &record);
        }

        Ok(CommandResult::success())
    }
}
