//! Terminal user interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for terminal output
//! - [`MockUI`] for capturing output in tests
//! - [`ProgressInstaller`] for live install progress
//!
//! # Example
//!
//! ```
//! use statpack::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("3 packages installed");
//! assert_eq!(ui.successes(), ["3 packages installed"]);
//! ```

pub mod mock;
pub mod output;
pub mod progress;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use progress::{format_duration, format_relative_time, ProgressInstaller};
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, StatpackTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Display a skipped/neutral status line.
    fn skipped(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);
}
