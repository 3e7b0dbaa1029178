//! Non-interactive notebook execution with papermill.

use crate::error::{NbenvError, Result};
use crate::process::{Captured, CommandLine, Runner};
use crate::provision::EnvLayout;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One notebook run inside an existing environment.
#[derive(Debug, Clone)]
pub struct NotebookRun {
    /// Environment root (the venv directory)
    pub venv: PathBuf,
    pub notebook: PathBuf,
    pub output: PathBuf,
    /// YAML parameter overrides passed with `-f`
    pub params_file: Option<PathBuf>,
    /// Environment variables set for the run only
    pub env: BTreeMap<String, String>,
}

impl NotebookRun {
    pub fn new(venv: PathBuf, notebook: PathBuf, output: PathBuf) -> Self {
        Self {
            venv,
            notebook,
            output,
            params_file: None,
            env: BTreeMap::new(),
        }
    }

    pub fn params_file(mut self, params_file: Option<PathBuf>) -> Self {
        self.params_file = params_file;
        self
    }

    pub fn env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// The papermill invocation for this run.
    pub fn command(&self) -> CommandLine {
        let mut cmd = CommandLine::new(EnvLayout::new(&self.venv).python())
            .args(["-m", "papermill"])
            .arg(&self.notebook)
            .arg(&self.output);
        if let Some(ref params) = self.params_file {
            cmd = cmd.arg("-f").arg(params);
        }
        for (key, value) in &self.env {
            cmd = cmd.env(key, value);
        }
        cmd
    }
}

/// Execute a notebook once. Any failure is an [`NbenvError::Execution`].
pub fn run_notebook<R: Runner + ?Sized>(runner: &R, run: &NotebookRun) -> Result<Captured> {
    let python = EnvLayout::new(&run.venv).python();
    if !python.exists() {
        return Err(NbenvError::Execution(Box::new(NbenvError::ToolNotFound(
            python.display().to_string(),
        ))));
    }

    tracing::info!(
        notebook = %run.notebook.display(),
        output = %run.output.display(),
        "Running notebook"
    );
    runner
        .run(&run.command())
        .map_err(|e| NbenvError::Execution(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;
    use std::fs;
    use tempfile::TempDir;

    fn fake_venv() -> TempDir {
        let temp = TempDir::new().unwrap();
        let python = EnvLayout::new(temp.path()).python();
        fs::create_dir_all(python.parent().unwrap()).unwrap();
        fs::write(&python, "").unwrap();
        temp
    }

    #[test]
    fn test_command_without_params() {
        let run = NotebookRun::new(
            PathBuf::from("/envs/demo"),
            PathBuf::from("ingest.ipynb"),
            PathBuf::from("out/ingest_out.ipynb"),
        );
        let cmd = run.command();
        assert_eq!(cmd.program(), EnvLayout::new("/envs/demo").python());
        assert!(cmd
            .render()
            .ends_with("-m papermill ingest.ipynb out/ingest_out.ipynb"));
    }

    #[test]
    fn test_command_with_params_and_env() {
        let mut env = BTreeMap::new();
        env.insert(
            "MLFLOW_TRACKING_URI".to_string(),
            "http://mlflow:5000".to_string(),
        );
        let run = NotebookRun::new(
            PathBuf::from("/envs/demo"),
            PathBuf::from("train.ipynb"),
            PathBuf::from("train_out.ipynb"),
        )
        .params_file(Some(PathBuf::from("params.yaml")))
        .env(env);

        let cmd = run.command();
        assert!(cmd
            .render()
            .ends_with("-m papermill train.ipynb train_out.ipynb -f params.yaml"));
        assert_eq!(cmd.get_envs().len(), 1);
    }

    #[test]
    fn test_missing_interpreter_is_execution_error() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let run = NotebookRun::new(
            temp.path().join("missing"),
            PathBuf::from("a.ipynb"),
            PathBuf::from("b.ipynb"),
        );

        let err = run_notebook(&runner, &run).unwrap_err();
        assert!(matches!(err, NbenvError::Execution(_)));
        assert!(runner.rendered().is_empty());
    }

    #[test]
    fn test_cell_error_propagates_exit_code() {
        let venv = fake_venv();
        let runner = ScriptedRunner::new().fail("papermill", 1, "PapermillExecutionError: cell 3");
        let run = NotebookRun::new(
            venv.path().to_path_buf(),
            PathBuf::from("a.ipynb"),
            PathBuf::from("b.ipynb"),
        );

        let err = run_notebook(&runner, &run).unwrap_err();
        assert!(matches!(err, NbenvError::Execution(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("PapermillExecutionError"));
        assert_eq!(runner.rendered().len(), 1);
    }

    #[test]
    fn test_successful_run() {
        let venv = fake_venv();
        let runner = ScriptedRunner::new().reply("papermill", "Executing: 100%");
        let run = NotebookRun::new(
            venv.path().to_path_buf(),
            PathBuf::from("a.ipynb"),
            PathBuf::from("b.ipynb"),
        );

        let captured = run_notebook(&runner, &run).unwrap();
        assert_eq!(captured.stdout, "Executing: 100%");
    }
}
