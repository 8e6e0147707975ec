//! Configuration file discovery and loading.
//!
//! Parameters are layered in this order (later overrides earlier):
//! 1. Project config (`.statpack/config.yml`, or the `--config` path)
//! 2. Environment variables (see [`env_layer`](crate::config::env_layer))
//! 3. Explicit caller arguments

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::env_layer::params_from_env;
use crate::config::params::SetParams;
use crate::error::{Result, StatpackError};

/// Directory holding the project config.
pub const CONFIG_DIR: &str = ".statpack";

/// Project config file name.
pub const CONFIG_FILE: &str = "config.yml";

/// Find the project config at `.statpack/config.yml`.
pub fn find_project_config(project_root: &Path) -> Option<PathBuf> {
    let path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<SetParams> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StatpackError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StatpackError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into [`SetParams`].
///
/// An empty document is an empty parameter set.
pub fn parse_config(content: &str, source_path: &Path) -> Result<SetParams> {
    if content.trim().is_empty() {
        return Ok(SetParams::default());
    }

    serde_yaml::from_str(content).map_err(|e| StatpackError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the file layer.
///
/// An explicit path must exist; a discovered project config is optional.
pub fn load_file_layer(project_root: &Path, explicit: Option<&Path>) -> Result<SetParams> {
    match explicit {
        Some(path) => load_config_file(path),
        None => match find_project_config(project_root) {
            Some(path) => {
                tracing::debug!("Loading project config from {}", path.display());
                load_config_file(&path)
            }
            None => Ok(SetParams::default()),
        },
    }
}

/// Load the file and environment layers and overlay `args` on top.
pub fn load_params(
    project_root: &Path,
    explicit: Option<&Path>,
    args: SetParams,
) -> Result<SetParams> {
    let file = load_file_layer(project_root, explicit)?;
    let env = params_from_env()?;
    Ok(file.overlay(env).overlay(args))
}
