//! `nbenv provision` command implementation.

use crate::error::Result;
use crate::kernel::JupyterKernelspec;
use crate::process::{SystemRunner, Verbosity};
use crate::provision::{
    EnvLayout, Progress, ProvisionStep, Provisioner, KERNEL_ADAPTER_PACKAGE, TOOLCHAIN_PACKAGES,
};
use crate::version::Resolution;
use crate::spec::EnvSpec;
use crate::tools::{find_tool, Tool};
use crate::version::Pyenv;
use std::path::PathBuf;

/// Arguments for the provision command.
pub struct ProvisionArgs {
    /// Environment spec file (YAML)
    pub spec: PathBuf,
    /// Directory the environment is created in
    pub venv_root: PathBuf,
    /// Explicit pyenv executable
    pub pyenv: Option<PathBuf>,
    /// Explicit jupyter executable
    pub jupyter: Option<PathBuf>,
    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Execute the provision command.
pub fn execute(args: ProvisionArgs) -> Result<()> {
    // Validate the spec before touching any tool
    let spec = EnvSpec::load(&args.spec)?;

    let pyenv = find_tool(Tool::Pyenv, args.pyenv.as_deref())?;
    // Registration runs through the environment's own python, so a missing
    // jupyter launcher does not block provisioning.
    let jupyter = find_tool(Tool::Jupyter, args.jupyter.as_deref())
        .unwrap_or_else(|_| PathBuf::from(Tool::Jupyter.binary()));

    println!(
        "Provisioning '{}' (Python {}) in {}",
        spec.venv_name,
        spec.python_version,
        args.venv_root.display()
    );
    println!();

    let runner = SystemRunner;
    let provisioner = Provisioner::new(
        runner,
        Pyenv::new(pyenv, runner),
        JupyterKernelspec::new(jupyter, runner),
    )
    .verbosity(args.verbosity);
    let layout = EnvLayout::for_spec(&args.venv_root, &spec);
    let env = provisioner.provision_with(&spec, &args.venv_root, |event| {
        print_progress(event, &spec, &layout)
    })?;

    println!();
    println!("Venv ready: {}", env.layout.root().display());
    println!();
    println!("Kernel:   {} ({})", env.kernel_name, env.display_name);
    println!("Python:   {}", env.layout.python().display());
    println!(
        "Manifest: {} ({} package(s))",
        env.layout.manifest().display(),
        env.frozen_packages
    );

    Ok(())
}

fn print_progress(event: Progress, spec: &EnvSpec, layout: &EnvLayout) {
    match event {
        Progress::ResolvingVersion => println!("Resolving Python {}...", spec.python_version),
        Progress::VersionReady(Resolution::AlreadyInstalled) => {
            println!("  Python {} already installed", spec.python_version)
        }
        Progress::VersionReady(Resolution::Installed) => {
            println!("  Installed Python {}", spec.python_version)
        }
        Progress::Started(ProvisionStep::CreateVenv) => {
            println!("Creating venv at {}...", layout.root().display())
        }
        Progress::Started(ProvisionStep::UpgradeToolchain) => {
            println!("Upgrading {}...", TOOLCHAIN_PACKAGES.join(", "))
        }
        Progress::Started(ProvisionStep::InstallPackages) => {
            println!("Installing {} package(s)...", spec.packages.len())
        }
        Progress::Skipped(ProvisionStep::InstallPackages) => println!("No packages to install"),
        Progress::Started(ProvisionStep::InstallKernelAdapter) => {
            println!("Installing {}...", KERNEL_ADAPTER_PACKAGE)
        }
        Progress::Started(ProvisionStep::RegisterKernel) => println!(
            "Registering kernel '{}' ({})...",
            spec.venv_name,
            spec.display_name()
        ),
        Progress::Started(ProvisionStep::SnapshotManifest) => {
            println!("Writing {}...", layout.manifest().display())
        }
        Progress::Skipped(step) => println!("Skipping {}", step),
    }
}
