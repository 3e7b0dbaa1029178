//! Environment specification files.
//!
//! A spec is a small YAML document:
//!
//! ```yaml
//! venv_name: ml_ingest_py38
//! python_version: "3.8.10"
//! packages:
//!   - numpy==1.24.4
//!   - pandas>=2
//! pip_extra_index: https://download.pytorch.org/whl/cu118
//! kernel_display_name: "ML Ingest (py3.8)"
//! ```

use crate::error::{NbenvError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A validated environment specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpec {
    /// Environment directory name and kernel name
    pub venv_name: String,
    /// Exact pyenv version string (e.g. "3.8.10")
    pub python_version: String,
    /// Packages to install, in declaration order
    pub packages: Vec<Requirement>,
    /// Extra index URL passed to pip for the package install step
    pub pip_extra_index: Option<String>,
    kernel_display_name: Option<String>,
}

/// On-disk shape; every field optional so validation can name what is missing.
#[derive(Debug, Deserialize)]
struct RawSpec {
    venv_name: Option<String>,
    python_version: Option<String>,
    #[serde(default)]
    packages: Option<Vec<String>>,
    pip_extra_index: Option<String>,
    kernel_display_name: Option<String>,
}

impl EnvSpec {
    /// Load and validate a spec file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NbenvError::SpecNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse and validate spec content. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let raw: Option<RawSpec> = serde_yaml::from_str(content)?;
        let raw = raw.ok_or_else(|| invalid(origin, "spec is empty"))?;

        let venv_name = required(raw.venv_name, "venv_name", origin)?;
        validate_venv_name(&venv_name).map_err(|reason| invalid(origin, &reason))?;
        let python_version = required(raw.python_version, "python_version", origin)?;

        let packages = raw
            .packages
            .unwrap_or_default()
            .iter()
            .map(|p| p.parse::<Requirement>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|reason| invalid(origin, &reason))?;

        Ok(Self {
            venv_name,
            python_version,
            packages,
            pip_extra_index: non_blank(raw.pip_extra_index),
            kernel_display_name: non_blank(raw.kernel_display_name),
        })
    }

    /// Kernel display name, defaulting to the environment name.
    pub fn display_name(&self) -> &str {
        self.kernel_display_name
            .as_deref()
            .unwrap_or(&self.venv_name)
    }
}

fn invalid(origin: &Path, reason: &str) -> NbenvError {
    NbenvError::InvalidSpec {
        path: origin.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str, origin: &Path) -> Result<String> {
    non_blank(value).ok_or_else(|| invalid(origin, &format!("missing required field '{}'", key)))
}

/// Validate a name usable both as a directory name and a Jupyter kernel name.
pub fn validate_venv_name(name: &str) -> std::result::Result<(), String> {
    if name == "." || name == ".." {
        return Err(format!("'{}' is not a valid venv_name", name));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!(
            "venv_name '{}' contains invalid character '{}' (allowed: letters, digits, '.', '_', '-')",
            name, ch
        ));
    }
    Ok(())
}

/// One package requirement, kept verbatim for pip.
///
/// Either a named requirement (`numpy==1.24.4`) or a direct reference to a
/// local path or URL (`/wheels/pkg-1.0-py3-none-any.whl`), which has no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    raw: String,
    /// Byte length of the leading name; 0 for a direct reference.
    name_len: usize,
}

impl Requirement {
    /// Distribution name, e.g. `torch` for `torch[cuda]>=2.0`.
    pub fn name(&self) -> Option<&str> {
        if self.name_len == 0 {
            None
        } else {
            Some(&self.raw[..self.name_len])
        }
    }

    /// Everything after the name (extras, version specifier, markers), if any.
    pub fn constraint(&self) -> Option<&str> {
        if self.name_len == 0 {
            return None;
        }
        let rest = self.raw[self.name_len..].trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn is_direct_reference(&self) -> bool {
        self.name_len == 0
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Requirement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err("package entries must not be empty".to_string());
        }
        if looks_like_location(raw) {
            return Ok(Self {
                raw: raw.to_string(),
                name_len: 0,
            });
        }
        let name_len = raw
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(raw.len());
        if name_len == 0 {
            return Err(format!("package entry '{}' has no package name", raw));
        }
        Ok(Self {
            raw: raw.to_string(),
            name_len,
        })
    }
}

/// A filesystem path or a bare URL, as opposed to `name @ url`.
fn looks_like_location(raw: &str) -> bool {
    if raw.starts_with(['/', '.', '~']) {
        return true;
    }
    match raw.find("://") {
        Some(scheme_end) => !raw[..scheme_end].contains('@'),
        None => false,
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
