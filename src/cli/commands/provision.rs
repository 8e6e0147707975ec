//! Provision command implementation.
//!
//! The `statpack provision` command probes every requirement and installs
//! the missing ones through R.

use crate::cli::args::ProvisionArgs;
use crate::config::ProvisioningConfig;
use crate::error::{Result, StatpackError};
use crate::requirements::{parse_requirements, LibraryIndex, RscriptInstaller};
use crate::runner::{Provisioner, RunReport};
use crate::state::{HistoryStore, RunRecord};
use crate::ui::{ProgressInstaller, StatpackTheme, UserInterface};

use super::dispatcher::{Command, CommandContext, CommandResult};
use super::display;

/// The provision command implementation.
pub struct ProvisionCommand {
    context: CommandContext,
    args: ProvisionArgs,
}

impl ProvisionCommand {
    /// Create a new provision command.
    pub fn new(context: &CommandContext, args: ProvisionArgs) -> Self {
        Self {
            context: context.clone(),
            args,
        }
    }
}

impl Command for ProvisionCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let params = self.context.resolve(self.args.to_params(self.context.debug))?;
        let (config, packages) = params.build()?;

        if packages.is_empty() {
            return Err(StatpackError::configuration(
                "no packages to provision; pass them as arguments or list them under `packages:` in .statpack/config.yml",
            ));
        }
        parse_requirements(&packages)?;

        let live = !self.args.json && ui.output_mode().shows_progress();
        if live {
            ui.show_header(&format!("Provisioning {} package(s)", packages.len()));
        }

        let index = LibraryIndex::discover_or_degraded(&config)?;
        let rscript = RscriptInstaller::new();
        let installer = if live {
            ProgressInstaller::new(&rscript, StatpackTheme::for_colors(self.context.colors))
        } else {
            ProgressInstaller::hidden(&rscript)
        };

        let report = Provisioner::new(&index, &installer).provision(&config, &packages);
        installer.finish();
        let report = report?;

        record_run(&config, &report);

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| StatpackError::Other(e.into()))?;
            ui.message(&json);
        } else {
            display::show_report(ui, &report);
        }

        if report.has_failures() {
            Ok(CommandResult::failure(1))
        } else {
            Ok(CommandResult::success())
        }
    }
}

/// Persist the run under the project data folder. Never fails the command.
fn record_run(config: &ProvisioningConfig, report: &RunReport) {
    let Some(folder) = config.project_data_folder.as_deref().filter(|p| p.is_dir()) else {
        return;
    };

    let store = HistoryStore::for_project(folder);
    if let Err(e) = store.save(&RunRecord::from_report(report)) {
        tracing::warn!("Could not record run at {}: {}", store.path().display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        CommandContext::new(temp.path())
    }

    #[test]
    fn no_packages_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let cmd = ProvisionCommand::new(&context(&temp), ProvisionArgs::default());
        let mut ui = MockUI::new();

        let err = cmd.execute(&mut ui).unwrap_err();
        assert!(matches!(err, StatpackError::Configuration { .. }));
    }

    #[test]
    fn unknown_download_method_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let args = ProvisionArgs {
            packages: vec!["sf".to_string()],
            download_method: Some("ftp".to_string()),
            ..Default::default()
        };
        let cmd = ProvisionCommand::new(&context(&temp), args);

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn invalid_package_fails_before_r_is_started() {
        let temp = TempDir::new().unwrap();
        let args = ProvisionArgs {
            packages: vec!["not a package".to_string()],
            ..Default::default()
        };
        let cmd = ProvisionCommand::new(&context(&temp), args);

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(matches!(err, StatpackError::Configuration { .. }));
    }

    #[test]
    fn missing_rscript_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".statpack")).unwrap();
        fs::write(
            temp.path().join(".statpack/config.yml"),
            "rscript: /nonexistent/statpack/Rscript\npackages: [sf]\n",
        )
        .unwrap();
        let cmd = ProvisionCommand::new(&context(&temp), ProvisionArgs::default());

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();
        assert!(matches!(err, StatpackError::CommandFailed { .. }));
    }

    #[test]
    fn record_run_skips_missing_folder() {
        let config = ProvisioningConfig {
            project_data_folder: Some("/nonexistent/statpack/project".into()),
            ..Default::default()
        };
        let report = RunReport {
            started_at: chrono::Utc::now(),
            duration_ms: 0,
            download_method: config.download_method,
            outcomes: vec![],
        };
        record_run(&config, &report);
        assert!(!std::path::Path::new("/nonexistent/statpack/project").exists());
    }
}
