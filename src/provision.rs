//! Environment provisioning pipeline.
//!
//! Turns an [`EnvSpec`] into a venv under a root directory, registered as a
//! Jupyter kernel, with a `pip freeze` manifest next to it. Steps run in a
//! fixed order and the first failure aborts the rest. Nothing is rolled back:
//! a failure can leave a pyenv version installed without a venv, or a venv
//! without a kernel.

use crate::error::{NbenvError, Result};
use crate::kernel::KernelRegistry;
use crate::process::{CommandLine, Runner, Verbosity};
use crate::spec::EnvSpec;
use crate::version::{ensure_version, Resolution, VersionManager};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Packages upgraded before anything else is installed.
pub const TOOLCHAIN_PACKAGES: &[&str] = &["pip", "setuptools", "wheel"];

/// Package that lets Jupyter use the environment as a kernel.
pub const KERNEL_ADAPTER_PACKAGE: &str = "ipykernel";

/// Suffix appended to the environment path to name its manifest.
const MANIFEST_SUFFIX: &str = "_pip_freeze.txt";

/// Pipeline steps after version resolution, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateVenv,
    UpgradeToolchain,
    InstallPackages,
    InstallKernelAdapter,
    RegisterKernel,
    SnapshotManifest,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionStep::CreateVenv => "create venv",
            ProvisionStep::UpgradeToolchain => "upgrade toolchain",
            ProvisionStep::InstallPackages => "install packages",
            ProvisionStep::InstallKernelAdapter => "install kernel adapter",
            ProvisionStep::RegisterKernel => "register kernel",
            ProvisionStep::SnapshotManifest => "snapshot manifest",
        };
        f.write_str(name)
    }
}

/// Progress events emitted while provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    ResolvingVersion,
    VersionReady(Resolution),
    Started(ProvisionStep),
    /// Step had nothing to do (an empty package list).
    Skipped(ProvisionStep),
}

/// Paths inside a venv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout of `<venv_root>/<name>`.
    pub fn for_spec(venv_root: &Path, spec: &EnvSpec) -> Self {
        Self::new(venv_root.join(&spec.venv_name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The environment's interpreter (`bin/python`, `Scripts/python.exe` on Windows).
    pub fn python(&self) -> PathBuf {
        #[cfg(windows)]
        {
            self.root.join("Scripts").join("python.exe")
        }

        #[cfg(not(windows))]
        {
            self.root.join("bin").join("python")
        }
    }

    /// Sibling manifest file, `<root>_pip_freeze.txt`.
    pub fn manifest(&self) -> PathBuf {
        let mut path: OsString = self.root.clone().into_os_string();
        path.push(MANIFEST_SUFFIX);
        PathBuf::from(path)
    }

    fn pip(&self) -> CommandLine {
        CommandLine::new(self.python()).args(["-m", "pip"])
    }
}

/// A venv produced by [`Provisioner::provision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedEnv {
    pub layout: EnvLayout,
    pub kernel_name: String,
    pub display_name: String,
    pub python_version: String,
    pub resolution: Resolution,
    /// Number of lines written to the manifest.
    pub frozen_packages: usize,
}

/// Drives the provisioning pipeline against injected collaborators.
pub struct Provisioner<R, V, K> {
    runner: R,
    versions: V,
    kernels: K,
    verbosity: Verbosity,
}

impl<R: Runner, V: VersionManager, K: KernelRegistry> Provisioner<R, V, K> {
    pub fn new(runner: R, versions: V, kernels: K) -> Self {
        Self {
            runner,
            versions,
            kernels,
            verbosity: 0,
        }
    }

    /// Set verbosity; at 3 and above pip installs run with `-vvv`.
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Provision `spec` under `venv_root`.
    pub fn provision(&self, spec: &EnvSpec, venv_root: &Path) -> Result<ProvisionedEnv> {
        self.provision_with(spec, venv_root, |_| {})
    }

    /// Provision `spec` under `venv_root`, reporting each step to `report`.
    pub fn provision_with(
        &self,
        spec: &EnvSpec,
        venv_root: &Path,
        mut report: impl FnMut(Progress),
    ) -> Result<ProvisionedEnv> {
        let layout = EnvLayout::for_spec(venv_root, spec);
        tracing::info!(
            venv = %layout.root().display(),
            python = %spec.python_version,
            packages = spec.packages.len(),
            "Provisioning environment"
        );

        report(Progress::ResolvingVersion);
        let resolution = ensure_version(&self.versions, &spec.python_version)?;
        let interpreter = self
            .versions
            .interpreter_path(&spec.python_version)
            .map_err(|e| NbenvError::VersionInstall {
                version: spec.python_version.clone(),
                failure: Box::new(e),
            })?;
        report(Progress::VersionReady(resolution));

        report(Progress::Started(ProvisionStep::CreateVenv));
        run_step(ProvisionStep::CreateVenv, || {
            fs::create_dir_all(venv_root)?;
            self.runner.run(
                &CommandLine::new(&interpreter)
                    .args(["-m", "venv"])
                    .arg(layout.root()),
            )?;
            Ok(())
        })?;

        report(Progress::Started(ProvisionStep::UpgradeToolchain));
        run_step(ProvisionStep::UpgradeToolchain, || {
            self.runner.run(
                &layout
                    .pip()
                    .args(["install", "--upgrade", "--ignore-installed"])
                    .args(TOOLCHAIN_PACKAGES),
            )?;
            Ok(())
        })?;

        if spec.packages.is_empty() {
            report(Progress::Skipped(ProvisionStep::InstallPackages));
        } else {
            report(Progress::Started(ProvisionStep::InstallPackages));
            run_step(ProvisionStep::InstallPackages, || {
                self.runner.run(&self.install_packages_command(&layout, spec))?;
                Ok(())
            })?;
        }

        report(Progress::Started(ProvisionStep::InstallKernelAdapter));
        run_step(ProvisionStep::InstallKernelAdapter, || {
            self.runner
                .run(&layout.pip().arg("install").arg(KERNEL_ADAPTER_PACKAGE))?;
            Ok(())
        })?;

        report(Progress::Started(ProvisionStep::RegisterKernel));
        run_step(ProvisionStep::RegisterKernel, || {
            self.kernels
                .register(&layout.python(), &spec.venv_name, spec.display_name())
        })?;

        report(Progress::Started(ProvisionStep::SnapshotManifest));
        let frozen_packages = run_step(ProvisionStep::SnapshotManifest, || {
            let captured = self.runner.run(&layout.pip().arg("freeze"))?;
            fs::write(layout.manifest(), &captured.stdout)?;
            Ok(captured.stdout.lines().filter(|l| !l.trim().is_empty()).count())
        })?;

        Ok(ProvisionedEnv {
            kernel_name: spec.venv_name.clone(),
            display_name: spec.display_name().to_string(),
            python_version: spec.python_version.clone(),
            layout,
            resolution,
            frozen_packages,
        })
    }

    fn install_packages_command(&self, layout: &EnvLayout, spec: &EnvSpec) -> CommandLine {
        let mut cmd = layout
            .pip()
            .args(["install", "--upgrade", "--ignore-installed"]);
        if self.verbosity >= 3 {
            cmd = cmd.arg("-vvv");
        }
        cmd = cmd.args(spec.packages.iter().map(|p| p.as_str()));
        if let Some(ref index) = spec.pip_extra_index {
            cmd = cmd.arg("--extra-index-url").arg(index);
        }
        cmd
    }
}

/// Run one pipeline step, tagging any failure with the step.
fn run_step<T>(step: ProvisionStep, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|e| {
        tracing::warn!(step = %step, error = %e, "Provisioning step failed");
        NbenvError::Provision {
            step,
            failure: Box::new(e),
        }
    })
}
