//! Per-package outcomes and the run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DownloadMethod;
use crate::error::{Result, StatpackError};
use crate::requirements::{InstallError, PackageRequirement};

/// What happened to one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallResult {
    /// Present before the run; no installer invocation.
    AlreadySatisfied,
    /// Installed by R's installer during this run.
    Installed,
    /// Missing, but installation is disabled.
    Skipped,
    /// The installer was invoked and failed.
    Failed,
}

impl InstallResult {
    pub fn label(&self) -> &'static str {
        match self {
            InstallResult::AlreadySatisfied => "satisfied",
            InstallResult::Installed => "installed",
            InstallResult::Skipped => "skipped",
            InstallResult::Failed => "failed",
        }
    }
}

/// Outcome for a single requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallationOutcome {
    pub requirement: PackageRequirement,
    pub result: InstallResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<InstallError>,
    /// Time spent in the installer (0 when it was not invoked).
    pub duration_ms: u64,
}

impl InstallationOutcome {
    /// Whether the installer was invoked for this requirement.
    pub fn invoked_installer(&self) -> bool {
        matches!(self.result, InstallResult::Installed | InstallResult::Failed)
    }
}

/// Counts per result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub satisfied: usize,
    pub installed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.satisfied + self.installed + self.skipped + self.failed
    }
}

/// Result of one provisioning run. Outcomes are in requirement order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Download method after platform normalization.
    pub download_method: DownloadMethod,
    pub outcomes: Vec<InstallationOutcome>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in &self.outcomes {
            match outcome.result {
                InstallResult::AlreadySatisfied => summary.satisfied += 1,
                InstallResult::Installed => summary.installed += 1,
                InstallResult::Skipped => summary.skipped += 1,
                InstallResult::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Whether any requirement failed to install.
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.result == InstallResult::Failed)
    }

    /// Number of installer invocations made during the run.
    pub fn installer_invocations(&self) -> usize {
        self.outcomes.iter().filter(|o| o.invoked_installer()).count()
    }

    /// Names of packages with the given result, in requirement order.
    pub fn names_with(&self, result: InstallResult) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result == result)
            .map(|o| o.requirement.name.as_str())
            .collect()
    }

    /// Look up the outcome for a package.
    pub fn outcome(&self, name: &str) -> Option<&InstallationOutcome> {
        self.outcomes.iter().find(|o| o.requirement.name == name)
    }

    /// Fail with the first failed outcome, for callers that treat any
    /// install failure as fatal to startup.
    pub fn ensure_installed(&self) -> Result<()> {
        match self
            .outcomes
            .iter()
            .find(|o| o.result == InstallResult::Failed)
        {
            Some(failed) => Err(StatpackError::Installation {
                package: failed.requirement.name.clone(),
                message: failed
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "installation failed".to_string()),
            }),
            None => Ok(()),
        }
    }

    /// Plain-text summary suitable for logs and terminals.
    ///
    /// One line per non-empty group, then one line per failure with its
    /// error, so an operator can act without re-running in debug mode.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for result in [
            InstallResult::AlreadySatisfied,
            InstallResult::Installed,
            InstallResult::Skipped,
            InstallResult::Failed,
        ] {
            let names = self.names_with(result);
            if !names.is_empty() {
                lines.push(format!(
                    "{} ({}): {}",
                    result.label(),
                    names.len(),
                    names.join(", ")
                ));
            }
        }
        for outcome in &self.outcomes {
            if let Some(error) = &outcome.error {
                lines.push(format!("  {}: {}", outcome.requirement.name, error));
            }
        }
        lines
    }
}
