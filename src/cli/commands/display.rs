//! Shared rendering for run reports and probe results.

use std::time::Duration;

use crate::requirements::{PackageRequirement, SatisfiedBy};
use crate::runner::{InstallResult, RunReport};
use crate::state::{RunRecord, RunStatus};
use crate::ui::{format_duration, format_relative_time, UserInterface};

/// Human-readable name of a package layer.
pub fn layer_label(layer: SatisfiedBy) -> &'static str {
    match layer {
        SatisfiedBy::BinaryLayer => "binary layer",
        SatisfiedBy::StatLangInstaller => "R library",
        SatisfiedBy::Unsatisfied => "not installed",
    }
}

/// Print one line per probed requirement.
pub fn show_requirements(ui: &mut dyn UserInterface, requirements: &[PackageRequirement]) {
    for req in requirements {
        let line = format!("{} ({})", req.name, layer_label(req.satisfied_by));
        if req.satisfied_by.is_satisfied() {
            ui.success(&line);
        } else {
            ui.skipped(&line);
        }
    }
}

/// Print the grouped summary of a run, every failure, and a closing line.
pub fn show_report(ui: &mut dyn UserInterface, report: &RunReport) {
    for result in [
        InstallResult::AlreadySatisfied,
        InstallResult::Installed,
        InstallResult::Skipped,
    ] {
        let names = report.names_with(result);
        if !names.is_empty() {
            ui.message(&format!(
                "{} ({}): {}",
                result.label(),
                names.len(),
                names.join(", ")
            ));
        }
    }

    for outcome in report
        .outcomes
        .iter()
        .filter(|o| o.result == InstallResult::Failed)
    {
        let reason = outcome
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "failed".to_string());
        ui.error(&format!("{}: {}", outcome.requirement.name, reason));
    }

    let summary = report.summary();
    let elapsed = format_duration(Duration::from_millis(report.duration_ms));
    if summary.failed > 0 {
        ui.warning(&format!(
            "{} of {} package(s) failed to install ({})",
            summary.failed,
            summary.total(),
            elapsed
        ));
    } else if summary.skipped > 0 {
        ui.warning(&format!(
            "{} package(s) missing; installation is disabled (pass --install)",
            summary.skipped
        ));
    } else {
        ui.success(&format!(
            "All {} package(s) available ({})",
            summary.total(),
            elapsed
        ));
    }
}

/// Print a recorded run.
pub fn show_record(ui: &mut dyn UserInterface, record: &RunRecord) {
    ui.show_header("Last run");
    ui.message(&format!(
        "When:      {} ({})",
        format_relative_time(record.timestamp),
        record.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));
    ui.message(&format!(
        "Duration:  {}",
        format_duration(Duration::from_millis(record.duration_ms))
    ));
    ui.message(&format!("Method:    {}", record.download_method));
    ui.message(&format!(
        "Status:    {}",
        match record.status {
            RunStatus::Success => "Success",
            RunStatus::Failed => "Failed",
        }
    ));
    ui.message("");

    for package in &record.packages {
        let line = format!("{:<20} {}", package.name, package.result.label());
        match package.result {
            InstallResult::Installed | InstallResult::AlreadySatisfied => ui.success(&line),
            InstallResult::Skipped => ui.skipped(&line),
            InstallResult::Failed => {
                let detail = package.error.as_deref().unwrap_or("failed");
                ui.error(&format!("{} {}", line, detail));
            }
        }
    }
}
