//! Run history recording.
//!
//! A [`RunRecord`] is the persisted form of a [`RunReport`]: enough to tell
//! an operator what the last run did without re-running it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::runner::{InstallResult, RunReport};

/// A record of a single provisioning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// When the run started.
    pub timestamp: DateTime<Utc>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Overall status.
    pub status: RunStatus,

    /// Download method the installer was given.
    pub download_method: String,

    /// One entry per requirement, in requirement order.
    pub packages: Vec<PackageRecord>,
}

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Failed,
}

/// Persisted outcome of one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub result: InstallResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Build a record from a finished run.
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            timestamp: report.started_at,
            duration_ms: report.duration_ms,
            status: if report.has_failures() {
                RunStatus::Failed
            } else {
                RunStatus::Success
            },
            download_method: report.download_method.to_string(),
            packages: report
                .outcomes
                .iter()
                .map(|o| PackageRecord {
                    name: o.requirement.name.clone(),
                    result: o.result,
                    error: o.error.as_ref().map(|e| e.to_string()),
                })
                .collect(),
        }
    }

    /// Names of packages with the given result.
    pub fn names_with(&self, result: InstallResult) -> Vec<&str> {
        self.packages
            .iter()
            .filter(|p| p.result == result)
            .map(|p| p.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadMethod;
    use crate::requirements::{InstallError, PackageRequirement, SatisfiedBy};
    use crate::runner::InstallationOutcome;

    fn outcome(name: &str, result: InstallResult, error: Option<InstallError>) -> InstallationOutcome {
        InstallationOutcome {
            requirement: PackageRequirement {
                name: name.to_string(),
                satisfied_by: SatisfiedBy::Unsatisfied,
            },
            result,
            error,
            duration_ms: 0,
        }
    }

    fn report(outcomes: Vec<InstallationOutcome>) -> RunReport {
        RunReport {
            started_at: Utc::now(),
            duration_ms: 1200,
            download_method: DownloadMethod::Curl,
            outcomes,
        }
    }

    #[test]
    fn record_from_successful_report() {
        let report = report(vec![
            outcome("sf", InstallResult::AlreadySatisfied, None),
            outcome("dodgr", InstallResult::Installed, None),
        ]);

        let record = RunRecord::from_report(&report);

        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.download_method, "curl");
        assert_eq!(record.duration_ms, 1200);
        assert_eq!(record.names_with(InstallResult::Installed), vec!["dodgr"]);
    }

    #[test]
    fn record_keeps_failure_detail() {
        let report = report(vec![outcome(
            "osmdata",
            InstallResult::Failed,
            Some(InstallError::Timeout { seconds: 900 }),
        )]);

        let record = RunRecord::from_report(&report);

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(
            record.packages[0].error.as_deref(),
            Some("timed out after 900s")
        );
    }
}
