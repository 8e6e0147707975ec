//! statpack - R package provisioning for statistical runtimes.
//!
//! Given a list of required R packages and a few transport settings,
//! statpack makes sure every package is installed: packages already present
//! (in a pre-built binary layer or an earlier install) are left alone, and
//! the rest are installed through R's own installer on a bounded worker
//! pool. One package failing never stops the others.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - `set_params` surface, config file and environment layers
//! - [`error`] - Error types and result aliases
//! - [`requirements`] - Package references, library probing and installation
//! - [`runner`] - Provisioning orchestration and the run report
//! - [`shell`] - Subprocess execution with timeouts
//! - [`state`] - Last-run record
//! - [`ui`] - Terminal output and install progress
//!
//! # Example
//!
//! ```
//! use statpack::config::{DownloadMethod, SetParams};
//!
//! let (config, packages) = SetParams::new()
//!     .packages(["sf", "dodgr"])
//!     .download_method("CURL")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.download_method, DownloadMethod::Curl);
//! assert_eq!(packages, vec!["sf", "dodgr"]);
//! ```
//!
//! See [`set_params`] for a complete provisioning call.

pub mod cli;
pub mod config;
pub mod error;
pub mod requirements;
pub mod runner;
pub mod shell;
pub mod state;
pub mod ui;

pub use config::{DownloadMethod, ProvisioningConfig, SetParams};
pub use error::{Result, StatpackError};
pub use runner::{provision, set_params, InstallResult, Provisioner, RunReport};
