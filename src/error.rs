//! Error types for statpack operations.
//!
//! This module defines [`StatpackError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - `Configuration` and `Filesystem` errors are fatal: they stop a
//!   provisioning run before any package is installed
//! - Per-package install failures are never raised through this type during
//!   a run; they are captured as [`InstallError`](crate::requirements::InstallError)
//!   on the corresponding outcome
//! - Use `anyhow::Error` (via `StatpackError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for statpack operations.
#[derive(Debug, Error)]
pub enum StatpackError {
    /// Invalid or incompatible provisioning settings.
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// A folder the installer needs is missing or not writable.
    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    /// A single package failed to install.
    #[error("Installation of '{package}' failed: {message}")]
    Installation { package: String, message: String },

    /// The package index could not be queried.
    #[error("Could not probe '{package}': {message}")]
    Probe { package: String, message: String },

    /// An external command could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatpackError {
    /// Shorthand for a [`StatpackError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a [`StatpackError::Filesystem`].
    pub fn filesystem(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Filesystem {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a provisioning run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Installation { .. } | Self::Probe { .. })
    }
}

/// Result type alias for statpack operations.
pub type Result<T> = std::result::Result<T, StatpackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_displays_message() {
        let err = StatpackError::configuration("unknown download method 'ftp'");
        assert!(err.to_string().contains("unknown download method 'ftp'"));
    }

    #[test]
    fn filesystem_displays_path_and_message() {
        let err = StatpackError::filesystem("/data/packages", "does not exist");
        let msg = err.to_string();
        assert!(msg.contains("/data/packages"));
        assert!(msg.contains("does not exist"));
    }

    #[test]
    fn installation_displays_package_and_message() {
        let err = StatpackError::Installation {
            package: "sf".into(),
            message: "exited with code 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sf"));
        assert!(msg.contains("exited with code 1"));
    }

    #[test]
    fn probe_displays_package() {
        let err = StatpackError::Probe {
            package: "dodgr".into(),
            message: "permission denied".into(),
        };
        assert!(err.to_string().contains("dodgr"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = StatpackError::CommandFailed {
            command: "Rscript".into(),
            code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("Rscript"));
        assert!(msg.contains("1"));
    }

    #[test]
    fn fatal_classification() {
        assert!(StatpackError::configuration("x").is_fatal());
        assert!(StatpackError::filesystem("/x", "y").is_fatal());
        assert!(!StatpackError::Installation {
            package: "a".into(),
            message: "b".into()
        }
        .is_fatal());
        assert!(!StatpackError::Probe {
            package: "a".into(),
            message: "b".into()
        }
        .is_fatal());
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StatpackError = io_err.into();
        assert!(matches!(err, StatpackError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(StatpackError::configuration("test"))
        }
        assert!(returns_error().is_err());
    }
}
