//! Jupyter kernel registry client.
//!
//! The registry is owned by Jupyter and shared by everything on the host.
//! Kernel names match environment names by convention only: a kernel may
//! outlive its environment and vice versa.

use crate::error::{NbenvError, Result};
use crate::process::{CommandLine, Runner};
use crate::spec::EnvSpec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Kernel that `remove_all` never touches unless configured otherwise.
pub const DEFAULT_PROTECTED_KERNEL: &str = "python3";

/// One registered kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInfo {
    pub name: String,
    pub display_name: String,
    pub resource_dir: PathBuf,
}

/// Host-wide kernel registry.
pub trait KernelRegistry {
    /// All registered kernels, sorted by name.
    fn list(&self) -> Result<Vec<KernelInfo>>;

    /// Register `python`'s environment as a kernel.
    fn register(&self, python: &Path, name: &str, display_name: &str) -> Result<()>;

    /// Remove a kernel without checking that it exists.
    fn uninstall(&self, name: &str) -> Result<()>;
}

impl<K: KernelRegistry + ?Sized> KernelRegistry for &K {
    fn list(&self) -> Result<Vec<KernelInfo>> {
        (**self).list()
    }

    fn register(&self, python: &Path, name: &str, display_name: &str) -> Result<()> {
        (**self).register(python, name, display_name)
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        (**self).uninstall(name)
    }
}

/// [`KernelRegistry`] backed by `jupyter kernelspec` and `ipykernel`.
pub struct JupyterKernelspec<R> {
    jupyter: PathBuf,
    runner: R,
}

impl<R: Runner> JupyterKernelspec<R> {
    pub fn new(jupyter: PathBuf, runner: R) -> Self {
        Self { jupyter, runner }
    }
}

impl<R: Runner> KernelRegistry for JupyterKernelspec<R> {
    fn list(&self) -> Result<Vec<KernelInfo>> {
        let captured = self.runner.run(
            &CommandLine::new(&self.jupyter).args(["kernelspec", "list", "--json"]),
        )?;
        parse_kernelspec_list(&captured.stdout)
    }

    fn register(&self, python: &Path, name: &str, display_name: &str) -> Result<()> {
        // Registration runs inside the environment so the kernel points at it.
        self.runner.run(
            &CommandLine::new(python)
                .args(["-m", "ipykernel", "install", "--user", "--name"])
                .arg(name)
                .arg("--display-name")
                .arg(display_name),
        )?;
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        self.runner.run(
            &CommandLine::new(&self.jupyter)
                .args(["kernelspec", "uninstall"])
                .arg(name)
                .arg("-f"),
        )?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct KernelspecList {
    #[serde(default)]
    kernelspecs: BTreeMap<String, KernelspecEntry>,
}

#[derive(Deserialize)]
struct KernelspecEntry {
    #[serde(default)]
    resource_dir: PathBuf,
    #[serde(default)]
    spec: KernelspecSpec,
}

#[derive(Deserialize, Default)]
struct KernelspecSpec {
    display_name: Option<String>,
}

/// Parse `jupyter kernelspec list --json` output.
fn parse_kernelspec_list(stdout: &str) -> Result<Vec<KernelInfo>> {
    let list: KernelspecList = serde_json::from_str(stdout)?;
    Ok(list
        .kernelspecs
        .into_iter()
        .map(|(name, entry)| KernelInfo {
            display_name: entry.spec.display_name.unwrap_or_else(|| "N/A".to_string()),
            resource_dir: entry.resource_dir,
            name,
        })
        .collect())
}

/// List registered kernels. An empty registry is not an error.
pub fn list_kernels<K: KernelRegistry + ?Sized>(registry: &K) -> Result<Vec<KernelInfo>> {
    registry.list()
}

/// Unregister one kernel, failing with [`NbenvError::KernelNotFound`] if it
/// is not currently listed.
pub fn unregister<K: KernelRegistry + ?Sized>(registry: &K, name: &str) -> Result<()> {
    let kernels = registry.list()?;
    if !kernels.iter().any(|k| k.name == name) {
        return Err(NbenvError::KernelNotFound(name.to_string()));
    }
    tracing::info!(kernel = name, "Unregistering kernel");
    registry.uninstall(name)
}

/// Unregister the kernel named by a spec file's `venv_name`.
///
/// The spec is loaded before `open_registry` is called, so a bad spec is
/// reported even on a host without jupyter.
pub fn unregister_from_spec<K, F>(spec_path: &Path, open_registry: F) -> Result<String>
where
    K: KernelRegistry,
    F: FnOnce() -> Result<K>,
{
    let spec = EnvSpec::load(spec_path)?;
    let registry = open_registry()?;
    unregister(&registry, &spec.venv_name)?;
    Ok(spec.venv_name)
}

/// Outcome of [`remove_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveAllOutcome {
    /// Nothing but the protected kernel (or nothing at all) was registered.
    NothingToRemove,
    /// The operator declined; no kernel was removed.
    Declined,
    /// These kernels were removed, in order.
    Removed(Vec<String>),
}

/// Remove every kernel except `protected`.
///
/// `confirm` sees the removal candidates and is called at most once, only
/// when there is something to remove. Removal stops at the first failure.
pub fn remove_all<K, F>(registry: &K, protected: &str, confirm: F) -> Result<RemoveAllOutcome>
where
    K: KernelRegistry + ?Sized,
    F: FnOnce(&[KernelInfo]) -> Result<bool>,
{
    let candidates: Vec<KernelInfo> = registry
        .list()?
        .into_iter()
        .filter(|k| k.name != protected)
        .collect();

    if candidates.is_empty() {
        return Ok(RemoveAllOutcome::NothingToRemove);
    }

    if !confirm(&candidates)? {
        tracing::info!(count = candidates.len(), "Bulk kernel removal declined");
        return Ok(RemoveAllOutcome::Declined);
    }

    let mut removed = Vec::with_capacity(candidates.len());
    for kernel in candidates {
        unregister(registry, &kernel.name)?;
        removed.push(kernel.name);
    }
    Ok(RemoveAllOutcome::Removed(removed))
}

/// Read one confirmation line: "y" or "yes" in any case proceeds.
/// Anything else, including end of input, declines.
pub fn read_confirmation<B: BufRead>(mut input: B) -> Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
