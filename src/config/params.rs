//! The `set_params` invocation surface.
//!
//! [`SetParams`] mirrors every field of [`ProvisioningConfig`] as an optional
//! value so that a project config file, the environment and explicit caller
//! arguments can each supply a subset. Layers are combined with
//! [`SetParams::overlay`] and turned into a validated config with
//! [`SetParams::build`], which is the only place raw strings such as the
//! download method are parsed.
//!
//! # Example
//!
//! ```
//! use statpack::config::{DownloadMethod, SetParams};
//!
//! let (config, packages) = SetParams::new()
//!     .packages(["sf", "dodgr", "sf"])
//!     .install_stat_packages(true)
//!     .download_method("curl")
//!     .build()
//!     .unwrap();
//!
//! assert!(config.install_stat_packages);
//! assert_eq!(config.download_method, DownloadMethod::Curl);
//! assert_eq!(packages, vec!["sf", "dodgr", "sf"]);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::method::DownloadMethod;
use crate::error::{Result, StatpackError};
use crate::shell::Platform;

/// Default number of concurrent installs.
pub const DEFAULT_MAX_WORKERS: usize = 2;

/// Default per-package install timeout.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Default CRAN mirror.
pub const DEFAULT_REPOS: &str = "https://cloud.r-project.org";

/// Default R front end used for probing and installing.
pub const DEFAULT_RSCRIPT: &str = "Rscript";

/// Resolved settings for one provisioning run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningConfig {
    /// Install missing packages through R's installer.
    pub install_stat_packages: bool,
    /// Transport passed to R's installer.
    pub download_method: DownloadMethod,
    /// Reinstall even when the package is already present.
    pub force_reinstall: bool,
    /// Emit every orchestration step as an INFO-level trace event.
    pub debug: bool,
    /// Upper bound on concurrent installs.
    pub max_workers: usize,
    /// Per-package install timeout.
    pub install_timeout: Duration,
    /// CRAN mirror URL.
    pub repos: String,
    /// Library packages are installed into (R default when unset).
    pub library_path: Option<PathBuf>,
    /// Rscript program.
    pub rscript: String,
    /// Persistent package-data folder.
    pub package_data_folder: Option<PathBuf>,
    /// Per-project data folder.
    pub project_data_folder: Option<PathBuf>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            install_stat_packages: false,
            download_method: DownloadMethod::Auto,
            force_reinstall: false,
            debug: false,
            max_workers: DEFAULT_MAX_WORKERS,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            repos: DEFAULT_REPOS.to_string(),
            library_path: None,
            rscript: DEFAULT_RSCRIPT.to_string(),
            package_data_folder: None,
            project_data_folder: None,
        }
    }
}

impl ProvisioningConfig {
    /// Pre-flight normalization for the runtime platform.
    ///
    /// Rewrites a download method the platform cannot use (WinINet outside
    /// Windows) to [`DownloadMethod::Auto`].
    pub fn normalized_for(mut self, platform: Platform) -> Self {
        let method = self.download_method.normalize_for(platform);
        if method != self.download_method {
            tracing::warn!(
                from = %self.download_method,
                to = %method,
                %platform,
                "Download method is not supported on this platform; using default"
            );
            self.download_method = method;
        }
        self
    }
}

/// Caller-supplied provisioning parameters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetParams {
    pub install_stat_packages: Option<bool>,
    pub download_method: Option<String>,
    pub force_reinstall: Option<bool>,
    pub debug: Option<bool>,
    pub max_workers: Option<usize>,
    pub install_timeout_secs: Option<u64>,
    pub repos: Option<String>,
    pub library_path: Option<PathBuf>,
    pub rscript: Option<String>,
    pub package_data_folder: Option<PathBuf>,
    pub project_data_folder: Option<PathBuf>,
    /// Requirement list, in caller order.
    pub packages: Vec<String>,
}

impl SetParams {
    /// Create an empty parameter set (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn install_stat_packages(mut self, enabled: bool) -> Self {
        self.install_stat_packages = Some(enabled);
        self
    }

    pub fn download_method(mut self, method: impl Into<String>) -> Self {
        self.download_method = Some(method.into());
        self
    }

    pub fn force_reinstall(mut self, force: bool) -> Self {
        self.force_reinstall = Some(force);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn package_data_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.package_data_folder = Some(path.into());
        self
    }

    pub fn project_data_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_data_folder = Some(path.into());
        self
    }

    pub fn repos(mut self, url: impl Into<String>) -> Self {
        self.repos = Some(url.into());
        self
    }

    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn rscript(mut self, program: impl Into<String>) -> Self {
        self.rscript = Some(program.into());
        self
    }

    /// Layer `higher` on top of `self`.
    ///
    /// Every field set in `higher` wins. A non-empty package list in `higher`
    /// replaces this one entirely; lists are never concatenated.
    pub fn overlay(self, higher: SetParams) -> SetParams {
        SetParams {
            install_stat_packages: higher.install_stat_packages.or(self.install_stat_packages),
            download_method: higher.download_method.or(self.download_method),
            force_reinstall: higher.force_reinstall.or(self.force_reinstall),
            debug: higher.debug.or(self.debug),
            max_workers: higher.max_workers.or(self.max_workers),
            install_timeout_secs: higher.install_timeout_secs.or(self.install_timeout_secs),
            repos: higher.repos.or(self.repos),
            library_path: higher.library_path.or(self.library_path),
            rscript: higher.rscript.or(self.rscript),
            package_data_folder: higher.package_data_folder.or(self.package_data_folder),
            project_data_folder: higher.project_data_folder.or(self.project_data_folder),
            packages: if higher.packages.is_empty() {
                self.packages
            } else {
                higher.packages
            },
        }
    }

    /// Validate and resolve into a [`ProvisioningConfig`] plus the raw
    /// requirement list.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an unknown download method, a zero worker
    /// limit or a zero timeout.
    pub fn build(&self) -> Result<(ProvisioningConfig, Vec<String>)> {
        let defaults = ProvisioningConfig::default();

        let download_method = match &self.download_method {
            Some(raw) => raw.parse::<DownloadMethod>()?,
            None => defaults.download_method,
        };

        let max_workers = self.max_workers.unwrap_or(defaults.max_workers);
        if max_workers == 0 {
            return Err(StatpackError::configuration(
                "max_workers must be at least 1",
            ));
        }

        let install_timeout = match self.install_timeout_secs {
            Some(0) => {
                return Err(StatpackError::configuration(
                    "install_timeout_secs must be greater than 0",
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.install_timeout,
        };

        let config = ProvisioningConfig {
            install_stat_packages: self
                .install_stat_packages
                .unwrap_or(defaults.install_stat_packages),
            download_method,
            force_reinstall: self.force_reinstall.unwrap_or(defaults.force_reinstall),
            debug: self.debug.unwrap_or(defaults.debug),
            max_workers,
            install_timeout,
            repos: self.repos.clone().unwrap_or(defaults.repos),
            library_path: self.library_path.clone(),
            rscript: self.rscript.clone().unwrap_or(defaults.rscript),
            package_data_folder: self.package_data_folder.clone(),
            project_data_folder: self.project_data_folder.clone(),
        };

        Ok((config, self.packages.clone()))
    }
}
