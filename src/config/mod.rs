//! Provisioning configuration.
//!
//! - [`method`] - Download method parsing and platform normalization
//! - [`params`] - The `set_params` surface and the resolved [`ProvisioningConfig`]
//! - [`env_layer`] - Environment variable layer
//! - [`loader`] - Project config discovery and layering

pub mod env_layer;
pub mod loader;
pub mod method;
pub mod params;

pub use env_layer::{params_from_env, params_from_env_with};
pub use loader::{find_project_config, load_config_file, load_params, parse_config};
pub use method::DownloadMethod;
pub use params::{ProvisioningConfig, SetParams};
