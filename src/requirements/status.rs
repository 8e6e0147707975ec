//! Requirement types.
//!
//! A requirement string from the calling application is parsed into a
//! [`PackageSpec`]; probing it yields a [`PackageRequirement`] describing
//! which layer, if any, already satisfies it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, StatpackError};

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9.]*[A-Za-z0-9]$").unwrap());

static GITHUB_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[A-Za-z0-9][A-Za-z0-9-]*)/(?P<name>[^/@\s]+)(?:@(?P<ref>[A-Za-z0-9._/-]+))?$")
        .unwrap()
});

/// Which package layer satisfies a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfiedBy {
    /// Pre-built package installed at container-build time.
    BinaryLayer,
    /// Installed by R's own installer (this run or an earlier one).
    StatLangInstaller,
    /// Not present anywhere.
    Unsatisfied,
}

impl SatisfiedBy {
    /// Whether the package is present.
    pub fn is_satisfied(&self) -> bool {
        !matches!(self, SatisfiedBy::Unsatisfied)
    }
}

/// Where a package is fetched from when it has to be installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PackageSource {
    /// The configured CRAN mirror.
    Cran,
    /// A GitHub repository, installed with `remotes::install_github`.
    GitHub {
        owner: String,
        reference: Option<String>,
    },
}

/// A parsed requirement. Identity is the package name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    pub name: String,
    pub source: PackageSource,
}

impl PackageSpec {
    /// Parse `name` or `owner/name[@ref]`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the string is not a valid R package
    /// reference.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        if let Some(caps) = GITHUB_SPEC.captures(raw) {
            let name = &caps["name"];
            validate_name(name, raw)?;
            return Ok(Self {
                name: name.to_string(),
                source: PackageSource::GitHub {
                    owner: caps["owner"].to_string(),
                    reference: caps.name("ref").map(|m| m.as_str().to_string()),
                },
            });
        }

        validate_name(raw, raw)?;
        Ok(Self {
            name: raw.to_string(),
            source: PackageSource::Cran,
        })
    }

    /// Install target as handed to R (`name` or `owner/name@ref`).
    pub fn install_target(&self) -> String {
        match &self.source {
            PackageSource::Cran => self.name.clone(),
            PackageSource::GitHub { owner, reference } => match reference {
                Some(r) => format!("{}/{}@{}", owner, self.name, r),
                None => format!("{}/{}", owner, self.name),
            },
        }
    }
}

impl std::fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.install_target())
    }
}

fn validate_name(name: &str, raw: &str) -> Result<()> {
    if PACKAGE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(StatpackError::configuration(format!(
            "'{}' is not a valid R package reference",
            raw
        )))
    }
}

/// Parse a requirement list, collapsing duplicates by package name.
///
/// The first occurrence of a name fixes both its position and its source.
pub fn parse_requirements<S: AsRef<str>>(raw: &[S]) -> Result<Vec<PackageSpec>> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(raw.len());

    for item in raw {
        let spec = PackageSpec::parse(item.as_ref())?;
        if seen.insert(spec.name.clone()) {
            specs.push(spec);
        } else {
            tracing::debug!("Ignoring duplicate requirement '{}'", item.as_ref());
        }
    }

    Ok(specs)
}

/// The probed state of one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRequirement {
    pub name: String,
    pub satisfied_by: SatisfiedBy,
}
