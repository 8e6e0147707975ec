//! Package index probing.
//!
//! An R package is installed when `<library>/<name>/DESCRIPTION` exists in
//! one of R's library roots. The [`LibraryIndex`] checks those roots
//! directly rather than starting an R session per package, and tags each
//! root with the layer it belongs to: the install target configured for
//! R's own installer is [`SatisfiedBy::StatLangInstaller`], every other root
//! (conda/mamba prefix, site library) is the binary layer.
//!
//! # Example
//!
//! ```
//! use statpack::requirements::{LibraryIndex, LibraryRoot, PackageIndex, SatisfiedBy};
//! use std::fs;
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! fs::create_dir_all(temp.path().join("sf")).unwrap();
//! fs::write(temp.path().join("sf/DESCRIPTION"), "Package: sf\n").unwrap();
//!
//! let index = LibraryIndex::new(vec![LibraryRoot::binary(temp.path())]);
//! assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::BinaryLayer);
//! assert_eq!(index.locate("dodgr").unwrap(), SatisfiedBy::Unsatisfied);
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::ProvisioningConfig;
use crate::error::{Result, StatpackError};
use crate::requirements::status::SatisfiedBy;
use crate::shell::{execute, CommandOptions};

/// Timeout for asking R where its libraries are.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(60);

const LIB_PATHS_QUERY: &str = ".libPaths()";

/// Read-only view of which packages are installed.
pub trait PackageIndex: Sync {
    /// Report which layer provides `name`.
    ///
    /// # Errors
    ///
    /// Returns `Probe` when the index cannot be read. Callers treat that as
    /// "not satisfied".
    fn locate(&self, name: &str) -> Result<SatisfiedBy>;
}

/// One R library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRoot {
    pub path: PathBuf,
    pub layer: SatisfiedBy,
}

impl LibraryRoot {
    /// A root populated at container-build time.
    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layer: SatisfiedBy::BinaryLayer,
        }
    }

    /// The root R's installer writes to.
    pub fn installer(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layer: SatisfiedBy::StatLangInstaller,
        }
    }
}

/// Filesystem-backed [`PackageIndex`] over a set of R library roots.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    roots: Vec<LibraryRoot>,
    /// Why R's library paths are unknown, if discovery failed.
    unavailable: Option<String>,
}

impl LibraryIndex {
    /// Create an index over explicit roots.
    pub fn new(roots: Vec<LibraryRoot>) -> Self {
        Self {
            roots,
            unavailable: None,
        }
    }

    /// An index for when R could not report its library paths.
    ///
    /// Only the configured install library is searched. A package not found
    /// there is a `Probe` error rather than a plain miss, so callers treat it
    /// as not satisfied without claiming it is absent.
    pub fn degraded(install_lib: Option<&Path>, reason: impl Into<String>) -> Self {
        Self {
            roots: install_lib.map(LibraryRoot::installer).into_iter().collect(),
            unavailable: Some(reason.into()),
        }
    }

    /// [`discover`](Self::discover), falling back to a [`degraded`](Self::degraded)
    /// index when R cannot be asked.
    ///
    /// # Errors
    ///
    /// Only errors that abort a run are returned; a failed `.libPaths()`
    /// query is logged and degrades the index.
    pub fn discover_or_degraded(config: &ProvisioningConfig) -> Result<Self> {
        match Self::discover(config) {
            Ok(index) => Ok(index),
            Err(e) if !e.is_fatal() => {
                tracing::warn!("{}; probing only the configured install library", e);
                Ok(Self::degraded(config.library_path.as_deref(), e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Ask R for its library paths and classify them.
    ///
    /// # Errors
    ///
    /// Returns `Probe` when `Rscript` cannot be started or the query fails.
    pub fn discover(config: &ProvisioningConfig) -> Result<Self> {
        let args = vec![
            "--vanilla".to_string(),
            "-e".to_string(),
            r#"cat(.libPaths(), sep = "\n")"#.to_string(),
        ];
        let options = CommandOptions {
            timeout: Some(DISCOVERY_TIMEOUT),
            ..Default::default()
        };

        let lib_paths_error = |message: String| StatpackError::Probe {
            package: LIB_PATHS_QUERY.to_string(),
            message,
        };

        let result = execute(&config.rscript, &args, &options).map_err(|e| match e {
            StatpackError::CommandFailed { command, .. } => {
                lib_paths_error(format!("'{}' not found or not executable", command))
            }
            other => other,
        })?;
        if result.timed_out {
            return Err(lib_paths_error(format!(
                "{} did not answer within {}s",
                config.rscript,
                DISCOVERY_TIMEOUT.as_secs()
            )));
        }
        if !result.success {
            return Err(lib_paths_error(format!(
                "{} exited with code {:?}",
                config.rscript, result.exit_code
            )));
        }

        let roots = classify_lib_paths(&result.stdout, config.library_path.as_deref());
        tracing::debug!("Discovered {} R library root(s)", roots.len());
        Ok(Self::new(roots))
    }

    fn check_root(root: &LibraryRoot, name: &str) -> std::io::Result<bool> {
        match fs::metadata(root.path.join(name).join("DESCRIPTION")) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl PackageIndex for LibraryIndex {
    fn locate(&self, name: &str) -> Result<SatisfiedBy> {
        let mut first_error: Option<(PathBuf, std::io::Error)> = None;

        // Binary roots first: a package present in both layers is credited to the binary layer
        let ordered = self
            .roots
            .iter()
            .filter(|r| r.layer == SatisfiedBy::BinaryLayer)
            .chain(self.roots.iter().filter(|r| r.layer != SatisfiedBy::BinaryLayer));

        for root in ordered {
            match Self::check_root(root, name) {
                Ok(true) => return Ok(root.layer),
                Ok(false) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some((root.path.clone(), e));
                    }
                }
            }
        }

        match (first_error, &self.unavailable) {
            (Some((path, e)), _) => Err(StatpackError::Probe {
                package: name.to_string(),
                message: format!("cannot read library {}: {}", path.display(), e),
            }),
            (None, Some(reason)) => Err(StatpackError::Probe {
                package: name.to_string(),
                message: format!("R library paths unknown ({})", reason),
            }),
            (None, None) => Ok(SatisfiedBy::Unsatisfied),
        }
    }
}

/// Turn `.libPaths()` output into classified roots.
///
/// The configured install library is tagged as the installer layer and is
/// appended when R does not list it yet (it may not exist before the first
/// install). Without one, R installs into the first listed root; that root
/// is the installer layer unless it is the only one, in which case it is
/// the environment's own library and stays binary.
pub fn classify_lib_paths(output: &str, install_lib: Option<&Path>) -> Vec<LibraryRoot> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let path = PathBuf::from(line);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    let target = match install_lib {
        Some(lib) => Some(lib.to_path_buf()),
        None if paths.len() > 1 => paths.first().cloned(),
        None => None,
    };

    let mut roots: Vec<LibraryRoot> = paths
        .into_iter()
        .map(|path| {
            if target.as_ref() == Some(&path) {
                LibraryRoot::installer(path)
            } else {
                LibraryRoot::binary(path)
            }
        })
        .collect();

    if let Some(lib) = target {
        if !roots.iter().any(|r| r.path == lib) {
            roots.push(LibraryRoot::installer(lib));
        }
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install_fake_package(root: &Path, name: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("DESCRIPTION"), format!("Package: {}\n", name)).unwrap();
    }

    #[test]
    fn locate_finds_binary_layer_package() {
        let temp = TempDir::new().unwrap();
        install_fake_package(temp.path(), "sf");

        let index = LibraryIndex::new(vec![LibraryRoot::binary(temp.path())]);
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::BinaryLayer);
    }

    #[test]
    fn locate_reports_installer_layer() {
        let temp = TempDir::new().unwrap();
        install_fake_package(temp.path(), "dodgr");

        let index = LibraryIndex::new(vec![LibraryRoot::installer(temp.path())]);
        assert_eq!(index.locate("dodgr").unwrap(), SatisfiedBy::StatLangInstaller);
    }

    #[test]
    fn locate_missing_package_is_unsatisfied() {
        let temp = TempDir::new().unwrap();
        let index = LibraryIndex::new(vec![LibraryRoot::binary(temp.path())]);
        assert_eq!(index.locate("osmdata").unwrap(), SatisfiedBy::Unsatisfied);
    }

    #[test]
    fn directory_without_description_is_not_installed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sf")).unwrap();

        let index = LibraryIndex::new(vec![LibraryRoot::binary(temp.path())]);
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::Unsatisfied);
    }

    #[test]
    fn nonexistent_root_is_just_empty() {
        let index = LibraryIndex::new(vec![LibraryRoot::installer("/nonexistent/statpack/lib")]);
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::Unsatisfied);
    }

    #[test]
    fn binary_layer_wins_when_present_in_both() {
        let user = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        install_fake_package(user.path(), "sf");
        install_fake_package(site.path(), "sf");

        // Installer root listed first, binary root still wins
        let index = LibraryIndex::new(vec![
            LibraryRoot::installer(user.path()),
            LibraryRoot::binary(site.path()),
        ]);
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::BinaryLayer);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_root_is_probe_error() {
        let temp = TempDir::new().unwrap();
        // A regular file where a library directory is expected
        let bogus = temp.path().join("not-a-dir");
        fs::write(&bogus, "").unwrap();

        let index = LibraryIndex::new(vec![LibraryRoot::binary(&bogus)]);
        let err = index.locate("sf").unwrap_err();
        assert!(matches!(err, StatpackError::Probe { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn readable_root_overrides_earlier_probe_error() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("not-a-dir");
        fs::write(&bogus, "").unwrap();
        let good = temp.path().join("lib");
        install_fake_package(&good, "sf");

        let index = LibraryIndex::new(vec![LibraryRoot::binary(&bogus), LibraryRoot::binary(&good)]);
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::BinaryLayer);
    }

    #[test]
    fn classify_tags_install_library() {
        let output = "/opt/rlib\n/opt/conda/lib/R/library\n\n";
        let roots = classify_lib_paths(output, Some(Path::new("/opt/rlib")));

        assert_eq!(
            roots,
            vec![
                LibraryRoot::installer("/opt/rlib"),
                LibraryRoot::binary("/opt/conda/lib/R/library"),
            ]
        );
    }

    #[test]
    fn classify_appends_unlisted_install_library() {
        let roots = classify_lib_paths(
            "/opt/conda/lib/R/library\n",
            Some(Path::new("/home/user/R/library")),
        );
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1], LibraryRoot::installer("/home/user/R/library"));
    }

    #[test]
    fn classify_without_install_library_tags_first_root() {
        let roots = classify_lib_paths("/home/user/R\n/opt/conda/lib/R/library\n/home/user/R\n", None);
        assert_eq!(
            roots,
            vec![
                LibraryRoot::installer("/home/user/R"),
                LibraryRoot::binary("/opt/conda/lib/R/library"),
            ]
        );
    }

    #[test]
    fn classify_single_root_stays_binary() {
        let roots = classify_lib_paths("/opt/conda/lib/R/library\n", None);
        assert_eq!(roots, vec![LibraryRoot::binary("/opt/conda/lib/R/library")]);
    }

    #[test]
    fn degraded_index_finds_install_library_packages() {
        let temp = TempDir::new().unwrap();
        install_fake_package(temp.path(), "sf");

        let index = LibraryIndex::degraded(Some(temp.path()), "Rscript not found");
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::StatLangInstaller);
    }

    #[test]
    fn degraded_index_reports_misses_as_probe_errors() {
        let index = LibraryIndex::degraded(None, "Rscript not found");
        let err = index.locate("dodgr").unwrap_err();

        assert!(matches!(err, StatpackError::Probe { ref package, .. } if package == "dodgr"));
        assert!(err.to_string().contains("Rscript not found"));
    }

    #[test]
    fn discover_missing_rscript_is_probe_error() {
        let config = ProvisioningConfig {
            rscript: "/nonexistent/statpack/Rscript".to_string(),
            ..Default::default()
        };
        let err = LibraryIndex::discover(&config).unwrap_err();
        assert!(matches!(err, StatpackError::Probe { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn discover_or_degraded_survives_missing_rscript() {
        let temp = TempDir::new().unwrap();
        install_fake_package(temp.path(), "sf");
        let config = ProvisioningConfig {
            rscript: "/nonexistent/statpack/Rscript".to_string(),
            library_path: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let index = LibraryIndex::discover_or_degraded(&config).unwrap();
        assert_eq!(index.locate("sf").unwrap(), SatisfiedBy::StatLangInstaller);
        assert!(index.locate("dodgr").is_err());
    }
}
