//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Get a command to run nbenv, isolated from the caller's environment.
#[allow(deprecated)]
pub fn nbenv(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nbenv").unwrap();
    cmd.current_dir(cwd)
        .env_remove("NBENV_PYENV")
        .env_remove("NBENV_JUPYTER")
        .env_remove("RUST_LOG");
    cmd
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// Write a spec file and return its path.
pub fn write_spec(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A fake `jupyter` that lists `kernels` and logs uninstalls to `log`.
#[cfg(unix)]
pub fn fake_jupyter(dir: &Path, kernels: &[&str], log: &Path) -> PathBuf {
    let entries: Vec<String> = kernels
        .iter()
        .map(|k| {
            format!(
                r#""{k}": {{"resource_dir": "/kernels/{k}", "spec": {{"display_name": "Kernel {k}"}}}}"#
            )
        })
        .collect();
    let json = format!(r#"{{"kernelspecs": {{{}}}}}"#, entries.join(", "));
    write_script(
        &dir.join("bin").join("jupyter"),
        &format!(
            r#"if [ "$2" = "list" ]; then
  cat <<'JSON'
{json}
JSON
  exit 0
fi
if [ "$2" = "uninstall" ]; then
  echo "$3" >> "{log}"
  exit 0
fi
exit 2
"#,
            json = json,
            log = log.display()
        ),
    )
}
