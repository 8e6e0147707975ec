//! Check command implementation.
//!
//! The `statpack check` command probes the R libraries and reports which
//! requirements are present. It never installs anything.

use crate::cli::args::CheckArgs;
use crate::error::{Result, StatpackError};
use crate::requirements::{parse_requirements, LibraryIndex, RscriptInstaller};
use crate::runner::Provisioner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};
use super::display;

/// The check command implementation.
pub struct CheckCommand {
    context: CommandContext,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(context: &CommandContext, args: CheckArgs) -> Self {
        Self {
            context: context.clone(),
            args,
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let params = self.context.resolve(self.args.to_params())?;
        let (config, packages) = params.build()?;

        if packages.is_empty() {
            return Err(StatpackError::configuration(
                "no packages to check; pass them as arguments or list them under `packages:` in .statpack/config.yml",
            ));
        }
        parse_requirements(&packages)?;

        let index = LibraryIndex::discover_or_degraded(&config)?;
        let installer = RscriptInstaller::new();
        let requirements = Provisioner::new(&index, &installer).check(&packages)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&requirements)
                .map_err(|e| StatpackError::Other(e.into()))?;
            ui.message(&json);
        } else {
            display::show_requirements(ui, &requirements);
        }

        let missing = requirements
            .iter()
            .filter(|r| !r.satisfied_by.is_satisfied())
            .count();
        if missing > 0 {
            if !self.args.json {
                ui.warning(&format!("{} package(s) not installed", missing));
            }
            Ok(CommandResult::failure(1))
        } else {
            Ok(CommandResult::success())
        }
    }
}
