//! `nbenv run` command implementation.

use crate::error::Result;
use crate::notebook::{run_notebook, NotebookRun};
use crate::process::{SystemRunner, Verbosity};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the run command.
pub struct RunArgs {
    /// Environment root
    pub venv: PathBuf,
    /// Input notebook
    pub notebook: PathBuf,
    /// Executed notebook to write
    pub output: PathBuf,
    /// Parameter overrides file
    pub params_file: Option<PathBuf>,
    /// Extra environment variables from nbenv.toml
    pub env: BTreeMap<String, String>,
    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Execute the run command.
pub fn execute(args: RunArgs) -> Result<()> {
    let run = NotebookRun::new(args.venv, args.notebook, args.output)
        .params_file(args.params_file)
        .env(args.env);

    println!("Running {}...", run.notebook.display());
    if let Some(ref params) = run.params_file {
        println!("Parameters: {}", params.display());
    }

    let captured = run_notebook(&SystemRunner, &run)?;

    // Level 1+: echo papermill's own progress output
    if args.verbosity >= 1 {
        let output = captured.combined();
        if !output.trim().is_empty() {
            println!("{}", output.trim_end());
        }
    }

    println!("Notebook executed successfully!");
    println!("Output: {}", run.output.display());

    Ok(())
}
