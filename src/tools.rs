//! Detection of the external tools nbenv drives.

use crate::error::{NbenvError, Result};
use std::path::{Path, PathBuf};

/// A host tool located by [`find_tool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Pyenv,
    Jupyter,
}

impl Tool {
    /// Executable name searched on `PATH`.
    pub fn binary(self) -> &'static str {
        match self {
            Tool::Pyenv => "pyenv",
            Tool::Jupyter => "jupyter",
        }
    }

    /// Environment variable holding an explicit path.
    pub fn env_var(self) -> &'static str {
        match self {
            Tool::Pyenv => "NBENV_PYENV",
            Tool::Jupyter => "NBENV_JUPYTER",
        }
    }

    /// Platform-specific default installation paths.
    fn default_paths(self) -> Vec<PathBuf> {
        let Some(home) = dirs::home_dir() else {
            return vec![];
        };

        match self {
            #[cfg(windows)]
            Tool::Pyenv => vec![
                home.join(r".pyenv\pyenv-win\bin\pyenv.bat"),
                home.join(r".pyenv\pyenv-win\bin\pyenv"),
            ],
            #[cfg(not(windows))]
            Tool::Pyenv => vec![home.join(".pyenv/bin/pyenv")],
            #[cfg(windows)]
            Tool::Jupyter => vec![],
            #[cfg(not(windows))]
            Tool::Jupyter => vec![home.join(".local/bin/jupyter")],
        }
    }
}

/// Check if a path is executable.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "exe" || ext == "bat" || ext == "cmd"
        })
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn is_executable(path: &Path) -> bool {
    path.exists()
}

/// Resolve a tool's executable.
///
/// Resolution order:
/// 1. explicit path (CLI flag, its environment variable, or nbenv.toml)
/// 2. PATH search (via `which`)
/// 3. platform-specific default paths
///
/// An explicit path must exist; it is never silently replaced by detection.
pub fn find_tool(tool: Tool, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(NbenvError::ToolNotFound(format!(
                "{} not found at specified path: {}",
                tool.binary(),
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = which::which(tool.binary()) {
        return Ok(path);
    }

    tool.default_paths()
        .into_iter()
        .find(|path| is_executable(path))
        .ok_or_else(|| {
            NbenvError::ToolNotFound(format!(
                "{} (install it, add it to PATH, or set {})",
                tool.binary(),
                tool.env_var()
            ))
        })
}
