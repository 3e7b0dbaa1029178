//! nbenv CLI entry point.

use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use nbenv::commands::kernel::KernelAction;
use nbenv::commands::{kernel, provision, run};
use nbenv::config::Config;
use nbenv::error::{NbenvError, Result};
use nbenv::logging::init_tracing;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nbenv")]
#[command(about = "Notebook environment provisioning CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to pyenv executable (overrides auto-detection)
    #[arg(long, global = true, env = "NBENV_PYENV")]
    pyenv: Option<PathBuf>,

    /// Path to jupyter executable (overrides auto-detection)
    #[arg(long, global = true, env = "NBENV_JUPYTER")]
    jupyter: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a venv from a spec and register it as a Jupyter kernel
    Provision {
        /// Environment spec file (YAML)
        #[arg(long)]
        spec: PathBuf,

        /// Directory to create the venv in (default: venv_root from nbenv.toml)
        #[arg(long)]
        venv_root: Option<PathBuf>,
    },

    /// Execute a notebook inside a venv with papermill
    Run {
        /// Venv directory to run in
        #[arg(long)]
        venv: PathBuf,

        /// Notebook to execute
        #[arg(long)]
        notebook: PathBuf,

        /// Where to write the executed notebook
        #[arg(long)]
        output: PathBuf,

        /// YAML file with parameter overrides
        #[arg(long)]
        params_file: Option<PathBuf>,
    },

    /// List or unregister Jupyter kernels
    #[command(group(
        ArgGroup::new("action")
            .required(true)
            .args(["kernel_name", "list_kernels", "remove_all", "spec"])
    ))]
    Kernel {
        /// Name of the kernel to unregister
        #[arg(long)]
        kernel_name: Option<String>,

        /// List all available kernels
        #[arg(long)]
        list_kernels: bool,

        /// Remove all kernels except the protected one (python3)
        #[arg(long)]
        remove_all: bool,

        /// Unregister the kernel named by a spec file (uses venv_name)
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Do not ask for confirmation with --remove-all
        #[arg(short, long, requires = "remove_all")]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run_cli() {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbose;
    init_tracing(verbosity);

    // Load optional config
    let config = Config::load_from_cwd()?.unwrap_or_default();

    // CLI / env var > config > auto-detect
    let pyenv = cli.pyenv.or_else(|| config.pyenv_path.clone());
    let jupyter = cli.jupyter.or_else(|| config.jupyter_path.clone());

    match cli.command {
        Command::Provision { spec, venv_root } => {
            let venv_root = venv_root.or(config.venv_root).ok_or_else(|| {
                NbenvError::ConfigError(
                    "--venv-root is required (or set venv_root in nbenv.toml)".into(),
                )
            })?;
            provision::execute(provision::ProvisionArgs {
                spec,
                venv_root,
                pyenv,
                jupyter,
                verbosity,
            })
        }

        Command::Run {
            venv,
            notebook,
            output,
            params_file,
        } => run::execute(run::RunArgs {
            venv,
            notebook,
            output,
            params_file,
            env: config.notebook_env,
            verbosity,
        }),

        Command::Kernel {
            kernel_name,
            list_kernels,
            remove_all,
            spec,
            yes,
        } => {
            let action = if list_kernels {
                KernelAction::List
            } else if remove_all {
                KernelAction::RemoveAll
            } else if let Some(name) = kernel_name {
                KernelAction::Unregister(name)
            } else if let Some(path) = spec {
                KernelAction::FromSpec(path)
            } else {
                return Err(NbenvError::ConfigError(
                    "one of --kernel-name, --list-kernels, --remove-all, --spec is required"
                        .into(),
                ));
            };
            let protected = config.protected_kernel().to_string();
            kernel::execute(kernel::KernelArgs {
                action,
                jupyter,
                protected,
                assume_yes: yes,
            })
        }

        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nbenv", &mut io::stdout());
            Ok(())
        }
    }
}
