//! Package requirements: parsing, probing and installation.
//!
//! # Modules
//!
//! - [`status`] - Requirement specs and the layer that satisfies them
//! - [`probe`] - Package index over R library roots
//! - [`installer`] - R installer invocation

pub mod installer;
pub mod probe;
pub mod status;

pub use installer::{needs_remotes, InstallError, PackageInstaller, RscriptInstaller};
pub use probe::{LibraryIndex, LibraryRoot, PackageIndex};
pub use status::{parse_requirements, PackageRequirement, PackageSource, PackageSpec, SatisfiedBy};
