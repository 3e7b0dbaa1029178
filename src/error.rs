//! Error types for nbenv.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::provision::ProvisionStep;

/// Result type alias for nbenv operations.
pub type Result<T> = std::result::Result<T, NbenvError>;

/// A failed external command, with whatever it printed before exiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Rendered command line.
    pub command: String,
    /// Exit code, `None` when killed by a signal or never started.
    pub exit_code: Option<i32>,
    /// Captured stdout followed by captured stderr. The two streams are
    /// read from separate pipes, so their relative interleaving is lost.
    pub output: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "`{}` exited with code {}", self.command, code)?,
            None => write!(f, "`{}` did not exit normally", self.command)?,
        }
        let output = self.output.trim();
        if !output.is_empty() {
            write!(f, "\n{}", output)?;
        }
        Ok(())
    }
}

/// Errors that can occur during nbenv operations.
#[derive(Error, Debug)]
pub enum NbenvError {
    #[error("Spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error("Invalid spec {path}: {reason}")]
    InvalidSpec { path: PathBuf, reason: String },

    #[error("Failed to install Python {version}: {failure}")]
    VersionInstall {
        version: String,
        failure: Box<NbenvError>,
    },

    #[error("Provisioning failed at step '{step}': {failure}")]
    Provision {
        step: ProvisionStep,
        failure: Box<NbenvError>,
    },

    #[error("Kernel '{0}' not found")]
    KernelNotFound(String),

    #[error("Notebook execution failed: {0}")]
    Execution(Box<NbenvError>),

    #[error("Command failed: {0}")]
    CommandFailed(CommandFailure),

    #[error("Executable not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl NbenvError {
    /// Process exit status to report for this error.
    ///
    /// Mirrors the exit code of the failing subprocess when there is one,
    /// otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            NbenvError::CommandFailed(failure) => match failure.exit_code {
                Some(code) if code != 0 => code,
                _ => 1,
            },
            NbenvError::VersionInstall { failure, .. }
            | NbenvError::Provision { failure, .. }
            | NbenvError::Execution(failure) => failure.exit_code(),
            _ => 1,
        }
    }

    /// Whether this error means the spec file could not be loaded.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            NbenvError::SpecNotFound(_) | NbenvError::InvalidSpec { .. } | NbenvError::Yaml(_)
        )
    }
}
