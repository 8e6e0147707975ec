//! Package installation through R's own installer.
//!
//! The orchestrator only supplies a package and the transport settings and
//! observes success or failure; mirror selection and source-versus-binary
//! decisions stay inside R.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::config::env_layer::{PACKAGE_DATA_FOLDER_VAR, PROJECT_DATA_FOLDER_VAR};
use crate::config::ProvisioningConfig;
use crate::error::StatpackError;
use crate::requirements::status::{PackageSource, PackageSpec};
use crate::shell::{execute, CommandOptions, CommandResult};

/// Lines of installer stderr kept in an error.
const ERROR_TAIL_LINES: usize = 5;

/// Why a single package failed to install.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstallError {
    /// The installer ran longer than the configured timeout and was killed.
    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The installer exited unsuccessfully.
    #[error("installer exited with code {code:?}: {detail}")]
    ExitStatus { code: Option<i32>, detail: String },

    /// The installer process could not be started.
    #[error("could not start installer: {message}")]
    Spawn { message: String },

    /// Any other failure (including a panicking installer).
    #[error("{message}")]
    Other { message: String },
}

/// Installs one package. Implementations must be safe to call from several
/// worker threads at once.
pub trait PackageInstaller: Sync {
    fn install(&self, spec: &PackageSpec, config: &ProvisioningConfig) -> Result<(), InstallError>;

    /// One-time setup before any install in a run starts.
    ///
    /// Called once with every package about to be installed, before the
    /// worker pool starts. An error fails the packages that depend on the
    /// setup (see [`needs_remotes`]).
    fn prepare(&self, _specs: &[&PackageSpec], _config: &ProvisioningConfig) -> Result<(), InstallError> {
        Ok(())
    }
}

/// Whether installing `spec` needs the `remotes` package.
pub fn needs_remotes(spec: &PackageSpec) -> bool {
    matches!(spec.source, PackageSource::GitHub { .. })
}

/// [`PackageInstaller`] that runs `Rscript --vanilla -e <expr>`.
#[derive(Debug, Clone, Default)]
pub struct RscriptInstaller;

impl RscriptInstaller {
    pub fn new() -> Self {
        Self
    }
}

impl RscriptInstaller {
    fn run(&self, package: &str, expr: String, config: &ProvisioningConfig) -> Result<(), InstallError> {
        let args = vec!["--vanilla".to_string(), "-e".to_string(), expr];
        let options = CommandOptions {
            env: installer_env(config),
            timeout: Some(config.install_timeout),
            ..Default::default()
        };

        tracing::debug!(package = %package, "{} {}", config.rscript, args.join(" "));

        let result = execute(&config.rscript, &args, &options).map_err(|e| match e {
            StatpackError::CommandFailed { command, .. } => InstallError::Spawn {
                message: format!("'{}' not found or not executable", command),
            },
            other => InstallError::Other {
                message: other.to_string(),
            },
        })?;

        interpret_result(&result, config)
    }
}

impl PackageInstaller for RscriptInstaller {
    fn install(&self, spec: &PackageSpec, config: &ProvisioningConfig) -> Result<(), InstallError> {
        self.run(&spec.name, install_expression(spec, config), config)
    }

    /// Install `remotes` once when any GitHub package is pending, so
    /// concurrent GitHub installs never race on its library lock.
    fn prepare(&self, specs: &[&PackageSpec], config: &ProvisioningConfig) -> Result<(), InstallError> {
        if !specs.iter().any(|spec| needs_remotes(spec)) {
            return Ok(());
        }
        self.run("remotes", remotes_expression(config), config)
    }
}

fn interpret_result(result: &CommandResult, config: &ProvisioningConfig) -> Result<(), InstallError> {
    if result.timed_out {
        Err(InstallError::Timeout {
            seconds: config.install_timeout.as_secs(),
        })
    } else if result.success {
        Ok(())
    } else {
        let detail = tail_lines(&result.stderr, ERROR_TAIL_LINES);
        Err(InstallError::ExitStatus {
            code: result.exit_code,
            detail: if detail.is_empty() {
                tail_lines(&result.stdout, ERROR_TAIL_LINES)
            } else {
                detail
            },
        })
    }
}

/// Environment for the installer subprocess.
///
/// The data folders are exported under the names the calling application
/// reads, and downloads are staged in the package-data folder.
pub fn installer_env(config: &ProvisioningConfig) -> HashMap<String, String> {
    let mut env = HashMap::new();
    if let Some(dir) = &config.package_data_folder {
        let dir = dir.to_string_lossy().to_string();
        env.insert(PACKAGE_DATA_FOLDER_VAR.to_string(), dir.clone());
        env.insert("TMPDIR".to_string(), dir);
    }
    if let Some(dir) = &config.project_data_folder {
        env.insert(
            PROJECT_DATA_FOLDER_VAR.to_string(),
            dir.to_string_lossy().to_string(),
        );
    }
    env
}

/// Build the R expression that installs `spec` and verifies it loads.
///
/// `install.packages` only warns when a package fails to build, so the
/// expression ends with a `requireNamespace` check that exits non-zero.
pub fn install_expression(spec: &PackageSpec, config: &ProvisioningConfig) -> String {
    let (mut expr, lib_arg) = session_prelude(config);
    let method = r_string(config.download_method.as_r_method());

    match &spec.source {
        PackageSource::Cran => expr.push(format!(
            "install.packages({}, method = {}{})",
            r_string(&spec.name),
            method,
            lib_arg
        )),
        PackageSource::GitHub { .. } => expr.push(format!(
            "remotes::install_github({}, upgrade = \"never\", force = TRUE{})",
            r_string(&spec.install_target()),
            lib_arg
        )),
    }

    expr.push(format!(
        "if (!requireNamespace({}, quietly = TRUE)) quit(status = 1)",
        r_string(&spec.name)
    ));

    expr.join("; ")
}

/// Build the R expression that makes `remotes` available, installing it
/// only when it does not load yet.
pub fn remotes_expression(config: &ProvisioningConfig) -> String {
    let (mut expr, lib_arg) = session_prelude(config);
    let method = r_string(config.download_method.as_r_method());

    expr.push(format!(
        "if (!requireNamespace(\"remotes\", quietly = TRUE)) install.packages(\"remotes\", method = {}{})",
        method, lib_arg
    ));
    expr.push("if (!requireNamespace(\"remotes\", quietly = TRUE)) quit(status = 1)".to_string());

    expr.join("; ")
}

/// Transport options and library setup shared by every expression, plus
/// the `lib =` argument for install calls.
fn session_prelude(config: &ProvisioningConfig) -> (Vec<String>, String) {
    let method = r_string(config.download_method.as_r_method());
    let repos = r_string(&config.repos);
    let lib = config
        .library_path
        .as_ref()
        .map(|p| r_string(&p.to_string_lossy()));

    let mut expr = vec![format!(
        "options(download.file.method = {}, repos = c(CRAN = {}))",
        method, repos
    )];

    if let Some(lib) = &lib {
        expr.push(format!(".libPaths(c({}, .libPaths()))", lib));
    }
    let lib_arg = lib
        .as_ref()
        .map(|l| format!(", lib = {}", l))
        .unwrap_or_default();

    (expr, lib_arg)
}

/// Quote `s` as an R string literal.
fn r_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadMethod;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config() -> ProvisioningConfig {
        ProvisioningConfig {
            download_method: DownloadMethod::Curl,
            ..Default::default()
        }
    }

    #[test]
    fn cran_expression_passes_method_and_repos() {
        let spec = PackageSpec::parse("sf").unwrap();
        let expr = install_expression(&spec, &config());

        assert!(expr.contains("install.packages(\"sf\", method = \"curl\")"));
        assert!(expr.contains("repos = c(CRAN = \"https://cloud.r-project.org\")"));
        assert!(expr.ends_with("if (!requireNamespace(\"sf\", quietly = TRUE)) quit(status = 1)"));
        assert!(!expr.contains("lib ="));
    }

    #[test]
    fn expression_targets_library_path() {
        let spec = PackageSpec::parse("dodgr").unwrap();
        let config = ProvisioningConfig {
            library_path: Some(PathBuf::from("/opt/rlib")),
            ..config()
        };
        let expr = install_expression(&spec, &config);

        assert!(expr.contains(".libPaths(c(\"/opt/rlib\", .libPaths()))"));
        assert!(expr.contains("lib = \"/opt/rlib\""));
    }

    #[test]
    fn github_expression_uses_remotes() {
        let spec = PackageSpec::parse("r-transit/gtfsrouter@main").unwrap();
        let expr = install_expression(&spec, &config());

        assert!(expr.contains("remotes::install_github(\"r-transit/gtfsrouter@main\""));
        assert!(expr.contains("requireNamespace(\"gtfsrouter\", quietly = TRUE)"));
        // remotes is bootstrapped once per run, never per package
        assert!(!expr.contains("install.packages(\"remotes\""));
    }

    #[test]
    fn remotes_expression_installs_into_library_path() {
        let config = ProvisioningConfig {
            library_path: Some(PathBuf::from("/opt/rlib")),
            ..config()
        };
        let expr = remotes_expression(&config);

        assert!(expr.contains("install.packages(\"remotes\", method = \"curl\", lib = \"/opt/rlib\")"));
        assert!(expr.ends_with("if (!requireNamespace(\"remotes\", quietly = TRUE)) quit(status = 1)"));
    }

    #[test]
    fn prepare_skips_r_without_github_packages() {
        // Would fail to spawn if it tried to run R
        let config = ProvisioningConfig {
            rscript: "/nonexistent/statpack/Rscript".to_string(),
            ..Default::default()
        };
        let sf = PackageSpec::parse("sf").unwrap();
        assert!(RscriptInstaller::new().prepare(&[&sf], &config).is_ok());
    }

    #[test]
    fn prepare_bootstraps_remotes_for_github_packages() {
        let config = ProvisioningConfig {
            rscript: "/nonexistent/statpack/Rscript".to_string(),
            ..Default::default()
        };
        let sf = PackageSpec::parse("sf").unwrap();
        let gtfs = PackageSpec::parse("r-transit/gtfsrouter").unwrap();

        let err = RscriptInstaller::new()
            .prepare(&[&sf, &gtfs], &config)
            .unwrap_err();
        assert!(matches!(err, InstallError::Spawn { .. }));
    }

    #[test]
    fn r_string_escapes_quotes_and_backslashes() {
        assert_eq!(r_string(r#"C:\R\lib "x""#), r#""C:\\R\\lib \"x\"""#);
    }

    #[test]
    fn env_exports_data_folders() {
        let config = ProvisioningConfig {
            package_data_folder: Some(PathBuf::from("/data/pkg")),
            project_data_folder: Some(PathBuf::from("/data/proj")),
            ..Default::default()
        };
        let env = installer_env(&config);

        assert_eq!(env.get(PACKAGE_DATA_FOLDER_VAR).map(String::as_str), Some("/data/pkg"));
        assert_eq!(env.get(PROJECT_DATA_FOLDER_VAR).map(String::as_str), Some("/data/proj"));
        assert_eq!(env.get("TMPDIR").map(String::as_str), Some("/data/pkg"));
    }

    #[test]
    fn env_empty_without_folders() {
        assert!(installer_env(&ProvisioningConfig::default()).is_empty());
    }

    #[test]
    fn timeout_result_maps_to_timeout_error() {
        let config = ProvisioningConfig {
            install_timeout: Duration::from_secs(42),
            ..Default::default()
        };
        let result = CommandResult::timeout(String::new(), String::new(), Duration::from_secs(42));
        assert_eq!(
            interpret_result(&result, &config),
            Err(InstallError::Timeout { seconds: 42 })
        );
    }

    #[test]
    fn failure_keeps_stderr_tail() {
        let stderr = (1..=8).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let result = CommandResult::failure(Some(1), String::new(), stderr, Duration::ZERO);

        match interpret_result(&result, &ProvisioningConfig::default()) {
            Err(InstallError::ExitStatus { code, detail }) => {
                assert_eq!(code, Some(1));
                assert!(detail.starts_with("line 4"));
                assert!(detail.ends_with("line 8"));
            }
            other => panic!("Expected ExitStatus, got {:?}", other),
        }
    }

    #[test]
    fn success_maps_to_ok() {
        let result = CommandResult::success(String::new(), String::new(), Duration::ZERO);
        assert!(interpret_result(&result, &ProvisioningConfig::default()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn missing_rscript_is_spawn_error() {
        let config = ProvisioningConfig {
            rscript: "/nonexistent/statpack/Rscript".to_string(),
            ..Default::default()
        };
        let spec = PackageSpec::parse("sf").unwrap();
        let err = RscriptInstaller::new().install(&spec, &config).unwrap_err();
        assert!(matches!(err, InstallError::Spawn { .. }));
    }

    #[test]
    fn install_error_display() {
        assert_eq!(
            InstallError::Timeout { seconds: 900 }.to_string(),
            "timed out after 900s"
        );
    }
}
