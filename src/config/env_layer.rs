//! Environment variable layer.
//!
//! The calling application points the orchestrator at its data folders
//! through `MOBILITY_PACKAGE_DATA_FOLDER` and `MOBILITY_PROJECT_DATA_FOLDER`;
//! the remaining variables let container entrypoints flip provisioning
//! behavior without editing the project config.

use std::path::PathBuf;

use crate::config::params::SetParams;
use crate::error::{Result, StatpackError};

/// Persistent package-data folder.
pub const PACKAGE_DATA_FOLDER_VAR: &str = "MOBILITY_PACKAGE_DATA_FOLDER";
/// Per-project data folder.
pub const PROJECT_DATA_FOLDER_VAR: &str = "MOBILITY_PROJECT_DATA_FOLDER";
/// Download method override.
pub const DOWNLOAD_METHOD_VAR: &str = "STATPACK_DOWNLOAD_METHOD";
/// Enable installation of missing packages.
pub const INSTALL_VAR: &str = "STATPACK_INSTALL";
/// Enable debug tracing.
pub const DEBUG_VAR: &str = "STATPACK_DEBUG";

/// Read the environment layer from the process environment.
pub fn params_from_env() -> Result<SetParams> {
    params_from_env_with(|key: &str| std::env::var(key))
}

/// Read the environment layer with a custom lookup function.
///
/// This allows testing without modifying actual environment variables.
/// Empty values are treated as unset.
pub fn params_from_env_with<F>(env_fn: F) -> Result<SetParams>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let get = |key: &str| env_fn(key).ok().filter(|v| !v.trim().is_empty());

    Ok(SetParams {
        package_data_folder: get(PACKAGE_DATA_FOLDER_VAR).map(PathBuf::from),
        project_data_folder: get(PROJECT_DATA_FOLDER_VAR).map(PathBuf::from),
        download_method: get(DOWNLOAD_METHOD_VAR),
        install_stat_packages: get(INSTALL_VAR)
            .map(|v| parse_bool(INSTALL_VAR, &v))
            .transpose()?,
        debug: get(DEBUG_VAR)
            .map(|v| parse_bool(DEBUG_VAR, &v))
            .transpose()?,
        ..Default::default()
    })
}

/// Parse a boolean flag value.
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(StatpackError::configuration(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> std::result::Result<String, VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn empty_environment_sets_nothing() {
        let params = params_from_env_with(env_from(&[])).unwrap();
        assert_eq!(params, SetParams::default());
    }

    #[test]
    fn reads_data_folders() {
        let params = params_from_env_with(env_from(&[
            (PACKAGE_DATA_FOLDER_VAR, "/home/mambauser/.mobility/data"),
            (PROJECT_DATA_FOLDER_VAR, "/home/mambauser/.mobility/data/projects"),
        ]))
        .unwrap();

        assert_eq!(
            params.package_data_folder,
            Some(PathBuf::from("/home/mambauser/.mobility/data"))
        );
        assert_eq!(
            params.project_data_folder,
            Some(PathBuf::from("/home/mambauser/.mobility/data/projects"))
        );
    }

    #[test]
    fn reads_flags_and_method() {
        let params = params_from_env_with(env_from(&[
            (INSTALL_VAR, "yes"),
            (DEBUG_VAR, "0"),
            (DOWNLOAD_METHOD_VAR, "curl"),
        ]))
        .unwrap();

        assert_eq!(params.install_stat_packages, Some(true));
        assert_eq!(params.debug, Some(false));
        assert_eq!(params.download_method.as_deref(), Some("curl"));
    }

    #[test]
    fn blank_values_are_unset() {
        let params = params_from_env_with(env_from(&[(PACKAGE_DATA_FOLDER_VAR, "  ")])).unwrap();
        assert!(params.package_data_folder.is_none());
    }

    #[test]
    fn invalid_boolean_is_configuration_error() {
        let err = params_from_env_with(env_from(&[(INSTALL_VAR, "sometimes")])).unwrap_err();
        assert!(matches!(err, StatpackError::Configuration { .. }));
        assert!(err.to_string().contains(INSTALL_VAR));
    }
}
