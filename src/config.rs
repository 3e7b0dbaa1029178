//! Configuration file handling for nbenv.

use crate::error::Result;
use crate::kernel::DEFAULT_PROTECTED_KERNEL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The configuration file name.
pub const CONFIG_FILE_NAME: &str = "nbenv.toml";

/// Configuration from nbenv.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Path to the pyenv executable
    pub pyenv_path: Option<PathBuf>,

    /// Path to the jupyter executable
    pub jupyter_path: Option<PathBuf>,

    /// Default `--venv-root` for `nbenv provision`
    pub venv_root: Option<PathBuf>,

    /// Kernel that `nbenv kernel --remove-all` keeps (default: python3)
    pub protected_kernel: Option<String>,

    /// Extra environment variables for `nbenv run` (e.g. MLFLOW_TRACKING_URI)
    #[serde(default)]
    pub notebook_env: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from nbenv.toml in the given directory or its parents.
    ///
    /// Returns `Ok(None)` if no configuration file is found.
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir
            .canonicalize()
            .unwrap_or_else(|_| start_dir.to_path_buf());

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "Loading config");
                let content = std::fs::read_to_string(&config_path)?;
                let config: Self = toml::from_str(&content)?;
                return Ok(Some(config));
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from the current directory.
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Kernel name `--remove-all` must never remove.
    pub fn protected_kernel(&self) -> &str {
        self.protected_kernel
            .as_deref()
            .unwrap_or(DEFAULT_PROTECTED_KERNEL)
    }
}
