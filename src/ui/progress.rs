//! Live install progress.

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

use crate::config::ProvisioningConfig;
use crate::requirements::{InstallError, PackageInstaller, PackageSpec};

use super::theme::StatpackTheme;

/// [`PackageInstaller`] decorator that drives a progress bar.
///
/// The bar starts empty; every install grows its length by one when it
/// starts and advances it when it ends, so the total is only ever the
/// number of packages that actually needed installing.
pub struct ProgressInstaller<'a> {
    inner: &'a dyn PackageInstaller,
    bar: ProgressBar,
    theme: StatpackTheme,
}

impl<'a> ProgressInstaller<'a> {
    /// Wrap `inner` with a visible progress bar.
    pub fn new(inner: &'a dyn PackageInstaller, theme: StatpackTheme) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.magenta} [{bar:24.magenta/dim}] {pos}/{len} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("█░ "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { inner, bar, theme }
    }

    /// Wrap `inner` without drawing anything.
    pub fn hidden(inner: &'a dyn PackageInstaller) -> Self {
        Self {
            inner,
            bar: ProgressBar::hidden(),
            theme: StatpackTheme::plain(),
        }
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PackageInstaller for ProgressInstaller<'_> {
    fn install(&self, spec: &PackageSpec, config: &ProvisioningConfig) -> Result<(), InstallError> {
        self.bar.inc_length(1);
        self.bar.set_message(format!("installing {}", spec.name));

        let start = Instant::now();
        let result = self.inner.install(spec, config);
        let elapsed = format_duration(start.elapsed());

        let line = match &result {
            Ok(()) => self
                .theme
                .format_success(&format!("{} {}", spec.name, self.theme.dim.apply_to(elapsed))),
            Err(e) => self.theme.format_error(&format!("{}: {}", spec.name, e)),
        };
        self.bar.println(line);
        self.bar.inc(1);

        result
    }

    fn prepare(&self, specs: &[&PackageSpec], config: &ProvisioningConfig) -> Result<(), InstallError> {
        self.bar.set_message("preparing installer");
        let result = self.inner.prepare(specs, config);
        if let Err(e) = &result {
            self.bar.println(self.theme.format_error(&format!("setup: {}", e)));
        }
        result
    }
}

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// Format a timestamp relative to now ("just now", "3 hours ago").
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now().signed_duration_since(timestamp).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (value, unit) = match seconds {
        s if s < 3600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3600, "hour"),
        s => (s / 86_400, "day"),
    };
    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}
