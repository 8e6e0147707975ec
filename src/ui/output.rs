//! Output verbosity.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Headers and live install progress.
    #[default]
    Normal,
    /// Final summary and errors only.
    Quiet,
}

impl OutputMode {
    /// Resolve from the global `--quiet` flag.
    pub fn from_quiet(quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Check if this mode shows headers and live progress.
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal)
    }
}
