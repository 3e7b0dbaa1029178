//! Python interpreter version resolution through pyenv.
//!
//! Installing a version mutates host-wide pyenv state; every environment on
//! the machine sees it immediately.

use crate::error::{NbenvError, Result};
use crate::process::{CommandLine, Runner};
use std::path::PathBuf;

/// Host-wide interpreter version manager.
pub trait VersionManager {
    /// Versions currently installed, one entry per version string.
    fn installed_versions(&self) -> Result<Vec<String>>;

    /// Install one version.
    fn install(&self, version: &str) -> Result<()>;

    /// Path of the `python` executable for an installed version.
    fn interpreter_path(&self, version: &str) -> Result<PathBuf>;
}

impl<V: VersionManager + ?Sized> VersionManager for &V {
    fn installed_versions(&self) -> Result<Vec<String>> {
        (**self).installed_versions()
    }

    fn install(&self, version: &str) -> Result<()> {
        (**self).install(version)
    }

    fn interpreter_path(&self, version: &str) -> Result<PathBuf> {
        (**self).interpreter_path(version)
    }
}

/// Outcome of [`ensure_version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    AlreadyInstalled,
    Installed,
}

/// Make sure `version` is installed, installing it when absent.
///
/// Matching is exact-string: "3.8" does not match an installed "3.8.10".
pub fn ensure_version<V: VersionManager + ?Sized>(
    manager: &V,
    version: &str,
) -> Result<Resolution> {
    let wrap = |e: NbenvError| NbenvError::VersionInstall {
        version: version.to_string(),
        failure: Box::new(e),
    };

    let installed = manager.installed_versions().map_err(wrap)?;
    if installed.iter().any(|v| v == version) {
        tracing::info!(version, "Python version already installed");
        return Ok(Resolution::AlreadyInstalled);
    }

    tracing::info!(version, "Python version not found, installing");
    manager.install(version).map_err(wrap)?;
    Ok(Resolution::Installed)
}

/// [`VersionManager`] backed by the `pyenv` executable.
pub struct Pyenv<R> {
    executable: PathBuf,
    runner: R,
}

impl<R: Runner> Pyenv<R> {
    pub fn new(executable: PathBuf, runner: R) -> Self {
        Self { executable, runner }
    }

    pub fn executable(&self) -> &PathBuf {
        &self.executable
    }

    fn command(&self) -> CommandLine {
        CommandLine::new(&self.executable)
    }
}

impl<R: Runner> VersionManager for Pyenv<R> {
    fn installed_versions(&self) -> Result<Vec<String>> {
        let captured = self
            .runner
            .run(&self.command().args(["versions", "--bare"]))?;
        Ok(parse_versions(&captured.stdout))
    }

    fn install(&self, version: &str) -> Result<()> {
        self.runner
            .run(&self.command().arg("install").arg(version))?;
        Ok(())
    }

    fn interpreter_path(&self, version: &str) -> Result<PathBuf> {
        // PYENV_VERSION scopes the selection to this one call instead of
        // writing a .python-version file into the working directory.
        let captured = self.runner.run(
            &self
                .command()
                .args(["which", "python"])
                .env("PYENV_VERSION", version),
        )?;
        let path = captured.stdout.trim();
        if path.is_empty() {
            return Err(NbenvError::ToolNotFound(format!(
                "python for pyenv version {}",
                version
            )));
        }
        Ok(PathBuf::from(path))
    }
}

/// Parse `pyenv versions --bare` output.
fn parse_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
