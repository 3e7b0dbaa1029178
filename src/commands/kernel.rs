//! `nbenv kernel` command implementation.

use crate::error::Result;
use crate::kernel::{
    list_kernels, read_confirmation, remove_all, unregister, unregister_from_spec,
    JupyterKernelspec, KernelInfo, KernelRegistry, RemoveAllOutcome,
};
use crate::process::SystemRunner;
use crate::tools::{find_tool, Tool};
use std::io::{self, Write};
use std::path::PathBuf;

/// What to do with the kernel registry.
pub enum KernelAction {
    /// Unregister one kernel by name
    Unregister(String),
    /// List registered kernels
    List,
    /// Remove every kernel except the protected one
    RemoveAll,
    /// Unregister the kernel named by a spec file
    FromSpec(PathBuf),
}

/// Arguments for the kernel command.
pub struct KernelArgs {
    pub action: KernelAction,
    /// Explicit jupyter executable
    pub jupyter: Option<PathBuf>,
    /// Kernel `RemoveAll` keeps
    pub protected: String,
    /// Skip the `RemoveAll` confirmation prompt
    pub assume_yes: bool,
}

/// Execute the kernel command.
pub fn execute(args: KernelArgs) -> Result<()> {
    let open_registry = || -> Result<JupyterKernelspec<SystemRunner>> {
        let jupyter = find_tool(Tool::Jupyter, args.jupyter.as_deref())?;
        Ok(JupyterKernelspec::new(jupyter, SystemRunner))
    };

    match args.action {
        KernelAction::List => {
            let kernels = list_kernels(&open_registry()?)?;
            print_kernels(&kernels);
        }
        KernelAction::Unregister(ref name) => {
            let registry = open_registry()?;
            println!("Unregistering kernel: {}", name);
            unregister(&registry, name)?;
            println!("Successfully unregistered kernel: {}", name);
        }
        KernelAction::FromSpec(ref path) => {
            // Spec errors take precedence over a missing jupyter
            let name = unregister_from_spec(path, open_registry)?;
            println!("Successfully unregistered kernel: {}", name);
        }
        KernelAction::RemoveAll => {
            execute_remove_all(&open_registry()?, &args.protected, args.assume_yes)?
        }
    }

    Ok(())
}

fn execute_remove_all<K: KernelRegistry>(
    registry: &K,
    protected: &str,
    assume_yes: bool,
) -> Result<()> {
    let outcome = remove_all(registry, protected, |candidates| {
        println!("Found {} kernel(s) to remove:", candidates.len());
        for kernel in candidates {
            println!("  - {}", kernel.name);
        }
        if assume_yes {
            return Ok(true);
        }
        print!("Are you sure you want to remove all these kernels? (y/N): ");
        io::stdout().flush()?;
        read_confirmation(io::stdin().lock())
    })?;

    match outcome {
        RemoveAllOutcome::NothingToRemove => {
            println!("No kernels to remove (keeping '{}').", protected)
        }
        RemoveAllOutcome::Declined => println!("Operation cancelled."),
        RemoveAllOutcome::Removed(names) => {
            for name in &names {
                println!("Successfully unregistered kernel: {}", name);
            }
            println!("Removed {} kernel(s).", names.len());
        }
    }

    Ok(())
}

fn print_kernels(kernels: &[KernelInfo]) {
    if kernels.is_empty() {
        println!("No kernels found.");
        return;
    }

    println!("Available kernels:");
    for kernel in kernels {
        println!("  - {}: {}", kernel.name, kernel.display_name);
        println!("    Location: {}", kernel.resource_dir.display());
    }
}
