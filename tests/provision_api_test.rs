//! Provisioning through the public API against real library directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use statpack::config::ProvisioningConfig;
use statpack::requirements::{
    InstallError, LibraryIndex, LibraryRoot, PackageInstaller, PackageSpec, SatisfiedBy,
};
use statpack::runner::{InstallResult, Provisioner};
use tempfile::TempDir;

/// Installer that writes a DESCRIPTION file into a library directory.
struct DirectoryInstaller {
    lib: PathBuf,
    calls: Mutex<Vec<String>>,
}

impl DirectoryInstaller {
    fn new(lib: &Path) -> Self {
        Self {
            lib: lib.to_path_buf(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PackageInstaller for DirectoryInstaller {
    fn install(&self, spec: &PackageSpec, _config: &ProvisioningConfig) -> Result<(), InstallError> {
        self.calls.lock().unwrap().push(spec.name.clone());
        let dir = self.lib.join(&spec.name);
        fs::create_dir_all(&dir).map_err(|e| InstallError::Other {
            message: e.to_string(),
        })?;
        fs::write(dir.join("DESCRIPTION"), format!("Package: {}\n", spec.name)).map_err(|e| {
            InstallError::Other {
                message: e.to_string(),
            }
        })
    }
}

struct Runtime {
    temp: TempDir,
}

impl Runtime {
    fn new(binary: &[&str]) -> Self {
        let temp = TempDir::new().unwrap();
        for dir in ["binary", "site", "pkg", "project"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        for name in binary {
            let dir = temp.path().join("binary").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("DESCRIPTION"), "").unwrap();
        }
        Self { temp }
    }

    fn path(&self, dir: &str) -> PathBuf {
        self.temp.path().join(dir)
    }

    fn index(&self) -> LibraryIndex {
        LibraryIndex::new(vec![
            LibraryRoot::binary(self.path("binary")),
            LibraryRoot::installer(self.path("site")),
        ])
    }

    fn config(&self) -> ProvisioningConfig {
        ProvisioningConfig {
            install_stat_packages: true,
            package_data_folder: Some(self.path("pkg")),
            project_data_folder: Some(self.path("project")),
            ..Default::default()
        }
    }
}

#[test]
fn provisioning_is_idempotent_over_real_directories() {
    let runtime = Runtime::new(&["sf"]);
    let index = runtime.index();
    let installer = DirectoryInstaller::new(&runtime.path("site"));
    let provisioner = Provisioner::new(&index, &installer);
    let packages = ["sf", "dodgr", "osmdata"];

    let first = provisioner.provision(&runtime.config(), &packages).unwrap();
    assert_eq!(
        first.names_with(InstallResult::Installed),
        vec!["dodgr", "osmdata"]
    );
    assert_eq!(
        first.outcome("sf").unwrap().requirement.satisfied_by,
        SatisfiedBy::BinaryLayer
    );

    let second = provisioner.provision(&runtime.config(), &packages).unwrap();
    assert_eq!(second.installer_invocations(), 0);
    assert_eq!(
        second.outcome("dodgr").unwrap().requirement.satisfied_by,
        SatisfiedBy::StatLangInstaller
    );

    let mut calls = installer.calls();
    calls.sort();
    assert_eq!(calls, vec!["dodgr", "osmdata"]);
}

#[test]
fn github_reference_installs_under_package_name() {
    let runtime = Runtime::new(&[]);
    let index = runtime.index();
    let installer = DirectoryInstaller::new(&runtime.path("site"));

    let report = Provisioner::new(&index, &installer)
        .provision(&runtime.config(), &["osm-search/gtfsrouter@v0.1.2", "gtfsrouter"])
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].requirement.name, "gtfsrouter");
    assert!(runtime.path("site/gtfsrouter/DESCRIPTION").exists());
}

#[test]
fn summary_lines_name_failures() {
    struct Refusing;
    impl PackageInstaller for Refusing {
        fn install(&self, _spec: &PackageSpec, _config: &ProvisioningConfig) -> Result<(), InstallError> {
            Err(InstallError::ExitStatus {
                code: Some(1),
                detail: "mirror unreachable".to_string(),
            })
        }
    }

    let runtime = Runtime::new(&["sf"]);
    let index = runtime.index();
    let report = Provisioner::new(&index, &Refusing)
        .provision(&runtime.config(), &["sf", "dodgr"])
        .unwrap();

    let lines = report.summary_lines();
    assert!(lines.contains(&"satisfied (1): sf".to_string()));
    assert!(lines.contains(&"failed (1): dodgr".to_string()));
    assert!(lines.iter().any(|l| l.contains("dodgr") && l.contains("mirror unreachable")));
}
