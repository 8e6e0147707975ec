//! Provisioning run orchestration.
//!
//! - [`orchestrator`] - Probe, plan and install requirements
//! - [`pool`] - Bounded worker pool preserving input order
//! - [`report`] - Per-package outcomes and the run report

pub mod orchestrator;
pub mod pool;
pub mod report;

pub use orchestrator::{check_data_folders, provision, set_params, Provisioner};
pub use pool::run_bounded;
pub use report::{InstallResult, InstallationOutcome, RunReport, RunSummary};
