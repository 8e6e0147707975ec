//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SetParams;

/// statpack - provision R packages for a statistical runtime.
#[derive(Debug, Parser)]
#[command(name = "statpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .statpack/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Make sure the required R packages are installed
    Provision(ProvisionArgs),

    /// Report which required packages are present, without installing
    Check(CheckArgs),

    /// Show the most recent provisioning run
    Last(LastArgs),
}

/// Arguments for the `provision` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProvisionArgs {
    /// Packages to provision (`name` or `owner/name[@ref]`); overrides the config list
    pub packages: Vec<String>,

    /// Install missing packages through R's installer
    #[arg(short, long)]
    pub install: bool,

    /// Download method passed to R's installer (auto, curl, wininet)
    #[arg(long, value_name = "METHOD")]
    pub download_method: Option<String>,

    /// Reinstall packages that are already present
    #[arg(short, long)]
    pub force: bool,

    /// Maximum concurrent installs
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Per-package install timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// CRAN mirror URL
    #[arg(long, value_name = "URL")]
    pub repos: Option<String>,

    /// Library directory to install into
    #[arg(long, value_name = "PATH")]
    pub lib: Option<PathBuf>,

    /// Package data folder
    #[arg(long, value_name = "PATH")]
    pub package_data: Option<PathBuf>,

    /// Project data folder
    #[arg(long, value_name = "PATH")]
    pub project_data: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    /// The explicit-argument layer. Flags left off stay unset so lower
    /// layers can supply them.
    pub fn to_params(&self, debug: bool) -> SetParams {
        SetParams {
            install_stat_packages: self.install.then_some(true),
            download_method: self.download_method.clone(),
            force_reinstall: self.force.then_some(true),
            debug: debug.then_some(true),
            max_workers: self.jobs,
            install_timeout_secs: self.timeout,
            repos: self.repos.clone(),
            library_path: self.lib.clone(),
            package_data_folder: self.package_data.clone(),
            project_data_folder: self.project_data.clone(),
            packages: self.packages.clone(),
            ..Default::default()
        }
    }
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Packages to check; overrides the config list
    pub packages: Vec<String>,

    /// Library directory packages are installed into
    #[arg(long, value_name = "PATH")]
    pub lib: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn to_params(&self) -> SetParams {
        SetParams {
            library_path: self.lib.clone(),
            packages: self.packages.clone(),
            ..Default::default()
        }
    }
}

/// Arguments for the `last` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LastArgs {
    /// Project data folder holding the run record
    #[arg(long, value_name = "PATH")]
    pub project_data: Option<PathBuf>,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}
