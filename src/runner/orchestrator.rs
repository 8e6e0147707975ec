//! Provisioning orchestrator.
//!
//! A run goes through four phases:
//!
//! 1. Pre-flight: normalize the download method for the platform and parse
//!    the requirement list (duplicates collapse, first occurrence wins)
//! 2. Probe every requirement against the [`PackageIndex`]
//! 3. Check the data folders, only if something has to be installed
//! 4. Run the installer's one-time setup, then install on a bounded worker
//!    pool and merge outcomes in input order
//!
//! Configuration and filesystem problems abort the run before any install.
//! Install failures are recorded on the outcome and never stop the run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use chrono::Utc;

use crate::config::env_layer::{PACKAGE_DATA_FOLDER_VAR, PROJECT_DATA_FOLDER_VAR};
use crate::config::{ProvisioningConfig, SetParams};
use crate::error::{Result, StatpackError};
use crate::requirements::{
    needs_remotes, parse_requirements, InstallError, LibraryIndex, PackageIndex,
    PackageInstaller, PackageRequirement, PackageSpec, RscriptInstaller, SatisfiedBy,
};
use crate::runner::pool::run_bounded;
use crate::runner::report::{InstallResult, InstallationOutcome, RunReport};
use crate::shell::Platform;

/// Emit at INFO when the run is in debug mode, DEBUG otherwise.
macro_rules! trace_step {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Runs provisioning against a package index and an installer.
pub struct Provisioner<'a> {
    index: &'a dyn PackageIndex,
    installer: &'a dyn PackageInstaller,
    platform: Platform,
}

/// What to do with one requirement after probing.
enum Plan {
    Satisfied(SatisfiedBy),
    Skip,
    Install,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner for the current platform.
    pub fn new(index: &'a dyn PackageIndex, installer: &'a dyn PackageInstaller) -> Self {
        Self {
            index,
            installer,
            platform: Platform::current(),
        }
    }

    /// Override the platform used for download-method normalization.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Provision `requirements` and report one outcome per distinct package.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the list is empty or holds an invalid package reference
    /// - `Filesystem` if something needs installing and a data folder is unusable
    pub fn provision<S: AsRef<str>>(
        &self,
        config: &ProvisioningConfig,
        requirements: &[S],
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let config = config.clone().normalized_for(self.platform);
        let specs = preflight(requirements)?;
        let debug = config.debug;

        trace_step!(
            debug,
            packages = specs.len(),
            download_method = %config.download_method,
            install = config.install_stat_packages,
            force = config.force_reinstall,
            workers = config.max_workers,
            "Starting provisioning run"
        );

        let plans: Vec<Plan> = specs.iter().map(|spec| self.plan(spec, &config)).collect();

        let pending: Vec<(usize, &PackageSpec)> = plans
            .iter()
            .zip(&specs)
            .enumerate()
            .filter(|(_, (plan, _))| matches!(plan, Plan::Install))
            .map(|(i, (_, spec))| (i, spec))
            .collect();

        if !pending.is_empty() {
            check_data_folders(&config)?;
        }

        let setup_error = self.prepare(&pending, &config);
        let installed = run_bounded(&pending, config.max_workers, |(_, spec)| match &setup_error {
            Some(error) if needs_remotes(spec) => failed(spec, error.clone(), 0),
            _ => self.install_one(spec, &config),
        });

        let mut slots: Vec<Option<InstallationOutcome>> = plans
            .into_iter()
            .zip(&specs)
            .map(|(plan, spec)| match plan {
                Plan::Satisfied(layer) => Some(outcome(spec, layer, InstallResult::AlreadySatisfied)),
                Plan::Skip => Some(outcome(spec, SatisfiedBy::Unsatisfied, InstallResult::Skipped)),
                Plan::Install => None,
            })
            .collect();

        for ((i, _), result) in pending.iter().zip(installed) {
            slots[*i] = Some(result);
        }

        let report = RunReport {
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            download_method: config.download_method,
            outcomes: slots.into_iter().flatten().collect(),
        };

        let summary = report.summary();
        trace_step!(
            debug,
            satisfied = summary.satisfied,
            installed = summary.installed,
            skipped = summary.skipped,
            failed = summary.failed,
            duration_ms = report.duration_ms,
            "Provisioning run finished"
        );

        Ok(report)
    }

    /// Probe without installing anything.
    pub fn check<S: AsRef<str>>(&self, requirements: &[S]) -> Result<Vec<PackageRequirement>> {
        let specs = preflight(requirements)?;
        Ok(specs
            .iter()
            .map(|spec| PackageRequirement {
                name: spec.name.clone(),
                satisfied_by: self.probe(spec, false),
            })
            .collect())
    }

    fn probe(&self, spec: &PackageSpec, debug: bool) -> SatisfiedBy {
        match self.index.locate(&spec.name) {
            Ok(layer) => {
                trace_step!(debug, package = %spec.name, satisfied_by = ?layer, "Probed package");
                layer
            }
            Err(e) => {
                tracing::warn!(package = %spec.name, "{}; treating as not installed", e);
                SatisfiedBy::Unsatisfied
            }
        }
    }

    fn plan(&self, spec: &PackageSpec, config: &ProvisioningConfig) -> Plan {
        let debug = config.debug;
        let layer = self.probe(spec, debug);

        if layer.is_satisfied() && !config.force_reinstall {
            return Plan::Satisfied(layer);
        }

        if !config.install_stat_packages {
            if layer.is_satisfied() {
                trace_step!(
                    debug,
                    package = %spec.name,
                    "Reinstall requested but installation is disabled; keeping existing package"
                );
                return Plan::Satisfied(layer);
            }
            trace_step!(debug, package = %spec.name, "Skipping: installation disabled");
            return Plan::Skip;
        }

        Plan::Install
    }

    /// Run the installer's one-time setup for `pending`.
    fn prepare(
        &self,
        pending: &[(usize, &PackageSpec)],
        config: &ProvisioningConfig,
    ) -> Option<InstallError> {
        if pending.is_empty() {
            return None;
        }
        let specs: Vec<&PackageSpec> = pending.iter().map(|(_, spec)| *spec).collect();
        trace_step!(config.debug, packages = specs.len(), "Preparing installer");

        let result = catch_unwind(AssertUnwindSafe(|| self.installer.prepare(&specs, config)))
            .unwrap_or_else(|_| {
                Err(InstallError::Other {
                    message: "installer setup panicked".to_string(),
                })
            });

        match result {
            Ok(()) => None,
            Err(error) => {
                tracing::warn!("Installer setup failed: {}", error);
                Some(error)
            }
        }
    }

    fn install_one(&self, spec: &PackageSpec, config: &ProvisioningConfig) -> InstallationOutcome {
        let debug = config.debug;
        trace_step!(
            debug,
            package = %spec.name,
            target = %spec.install_target(),
            download_method = %config.download_method,
            "Invoking installer"
        );

        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| self.installer.install(spec, config)))
            .unwrap_or_else(|_| {
                Err(InstallError::Other {
                    message: "installer panicked".to_string(),
                })
            });
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                trace_step!(debug, package = %spec.name, duration_ms, "Installed");
                InstallationOutcome {
                    duration_ms,
                    ..outcome(spec, SatisfiedBy::StatLangInstaller, InstallResult::Installed)
                }
            }
            Err(error) => failed(spec, error, duration_ms),
        }
    }
}

fn failed(spec: &PackageSpec, error: InstallError, duration_ms: u64) -> InstallationOutcome {
    tracing::warn!(package = %spec.name, duration_ms, "Install failed: {}", error);
    InstallationOutcome {
        error: Some(error),
        duration_ms,
        ..outcome(spec, SatisfiedBy::Unsatisfied, InstallResult::Failed)
    }
}

fn outcome(spec: &PackageSpec, satisfied_by: SatisfiedBy, result: InstallResult) -> InstallationOutcome {
    InstallationOutcome {
        requirement: PackageRequirement {
            name: spec.name.clone(),
            satisfied_by,
        },
        result,
        error: None,
        duration_ms: 0,
    }
}

fn preflight<S: AsRef<str>>(requirements: &[S]) -> Result<Vec<PackageSpec>> {
    if requirements.is_empty() {
        return Err(StatpackError::configuration(
            "at least one package requirement is needed",
        ));
    }
    parse_requirements(requirements)
}

/// Verify both data folders exist and are writable. Never creates them.
pub fn check_data_folders(config: &ProvisioningConfig) -> Result<()> {
    check_folder(
        "package data folder",
        PACKAGE_DATA_FOLDER_VAR,
        config.package_data_folder.as_deref(),
    )?;
    check_folder(
        "project data folder",
        PROJECT_DATA_FOLDER_VAR,
        config.project_data_folder.as_deref(),
    )
}

fn check_folder(label: &str, env_var: &str, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Err(StatpackError::filesystem(
            env_var,
            format!("{} is not configured", label),
        ));
    };

    if !path.is_dir() {
        return Err(StatpackError::filesystem(
            path,
            format!("{} does not exist or is not a directory", label),
        ));
    }

    let probe = path.join(format!(".statpack-write-check-{}", std::process::id()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| StatpackError::filesystem(path, format!("{} is not writable: {}", label, e)))?;
    let _ = std::fs::remove_file(&probe);

    Ok(())
}

/// Provision with the default collaborators: R library discovery through
/// `Rscript` and [`RscriptInstaller`].
pub fn provision<S: AsRef<str>>(config: &ProvisioningConfig, requirements: &[S]) -> Result<RunReport> {
    // Validate before starting R
    preflight(requirements)?;
    let index = LibraryIndex::discover_or_degraded(config)?;
    let installer = RscriptInstaller::new();
    Provisioner::new(&index, &installer).provision(config, requirements)
}

/// The single configuration call: resolve `params` and provision its
/// package list.
///
/// # Example
///
/// ```no_run
/// use statpack::{set_params, SetParams};
///
/// let report = set_params(
///     SetParams::new()
///         .packages(["sf", "dodgr", "osmdata"])
///         .install_stat_packages(true)
///         .download_method("auto")
///         .package_data_folder("/home/mambauser/.mobility/data")
///         .project_data_folder("/home/mambauser/.mobility/data/projects"),
/// )?;
/// for line in report.summary_lines() {
///     println!("{}", line);
/// }
/// # Ok::<(), statpack::StatpackError>(())
/// ```
pub fn set_params(params: SetParams) -> Result<RunReport> {
    let (config, packages) = params.build()?;
    provision(&config, &packages)
}
