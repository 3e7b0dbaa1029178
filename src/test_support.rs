//! In-memory fakes for the external collaborators.

use crate::error::{CommandFailure, NbenvError, Result};
use crate::kernel::{KernelInfo, KernelRegistry};
use crate::process::{Captured, CommandLine, Runner};
use crate::version::VersionManager;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

enum Reply {
    Stdout(String),
    Fail { code: i32, output: String },
}

/// Records every command and answers from substring-matched rules.
/// Commands matching no rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Reply)>,
    calls: RefCell<Vec<CommandLine>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands whose rendered form contains `needle` print `stdout`.
    pub fn reply(mut self, needle: &str, stdout: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Stdout(stdout.to_string())));
        self
    }

    /// Commands whose rendered form contains `needle` exit with `code`.
    pub fn fail(mut self, needle: &str, code: i32, output: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Reply::Fail {
                code,
                output: output.to_string(),
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.borrow().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandLine::render).collect()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, cmd: &CommandLine) -> Result<Captured> {
        self.calls.borrow_mut().push(cmd.clone());
        let rendered = cmd.render();
        match self.rules.iter().find(|(needle, _)| rendered.contains(needle.as_str())) {
            Some((_, Reply::Stdout(stdout))) => Ok(Captured {
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Some((_, Reply::Fail { code, output })) => {
                Err(NbenvError::CommandFailed(CommandFailure {
                    command: rendered,
                    exit_code: Some(*code),
                    output: output.clone(),
                }))
            }
            None => Ok(Captured::default()),
        }
    }
}

/// Version manager over an in-memory set of installed versions.
pub struct FakeVersionManager {
    versions: RefCell<Vec<String>>,
    installs: RefCell<Vec<String>>,
    fail_install: bool,
}

impl FakeVersionManager {
    pub fn with_versions(versions: &[&str]) -> Self {
        Self {
            versions: RefCell::new(versions.iter().map(|v| v.to_string()).collect()),
            installs: RefCell::new(Vec::new()),
            fail_install: false,
        }
    }

    pub fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }

    pub fn installs(&self) -> Vec<String> {
        self.installs.borrow().clone()
    }

    pub fn interpreter(&self, version: &str) -> PathBuf {
        PathBuf::from(format!("/fake/pyenv/versions/{}/bin/python", version))
    }
}

impl VersionManager for FakeVersionManager {
    fn installed_versions(&self) -> Result<Vec<String>> {
        Ok(self.versions.borrow().clone())
    }

    fn install(&self, version: &str) -> Result<()> {
        self.installs.borrow_mut().push(version.to_string());
        if self.fail_install {
            return Err(NbenvError::CommandFailed(CommandFailure {
                command: format!("pyenv install {}", version),
                exit_code: Some(1),
                output: format!("python-build: definition not found: {}", version),
            }));
        }
        self.versions.borrow_mut().push(version.to_string());
        Ok(())
    }

    fn interpreter_path(&self, version: &str) -> Result<PathBuf> {
        Ok(self.interpreter(version))
    }
}

/// Kernel registry held in memory.
pub struct FakeRegistry {
    kernels: RefCell<BTreeMap<String, KernelInfo>>,
    uninstalls: RefCell<Vec<String>>,
    registrations: RefCell<Vec<(PathBuf, String)>>,
}

impl FakeRegistry {
    pub fn new(names: &[&str]) -> Self {
        let kernels = names
            .iter()
            .map(|name| {
                let info = KernelInfo {
                    name: name.to_string(),
                    display_name: name.to_string(),
                    resource_dir: PathBuf::from("/fake/kernels").join(name),
                };
                (name.to_string(), info)
            })
            .collect();
        Self {
            kernels: RefCell::new(kernels),
            uninstalls: RefCell::new(Vec::new()),
            registrations: RefCell::new(Vec::new()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.kernels.borrow().keys().cloned().collect()
    }

    pub fn display_name(&self, name: &str) -> Option<String> {
        self.kernels
            .borrow()
            .get(name)
            .map(|k| k.display_name.clone())
    }

    pub fn uninstalls(&self) -> Vec<String> {
        self.uninstalls.borrow().clone()
    }

    pub fn registrations(&self) -> Vec<(PathBuf, String)> {
        self.registrations.borrow().clone()
    }
}

impl KernelRegistry for FakeRegistry {
    fn list(&self) -> Result<Vec<KernelInfo>> {
        Ok(self.kernels.borrow().values().cloned().collect())
    }

    fn register(&self, python: &Path, name: &str, display_name: &str) -> Result<()> {
        self.registrations
            .borrow_mut()
            .push((python.to_path_buf(), name.to_string()));
        self.kernels.borrow_mut().insert(
            name.to_string(),
            KernelInfo {
                name: name.to_string(),
                display_name: display_name.to_string(),
                resource_dir: PathBuf::from("/fake/kernels").join(name),
            },
        );
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        self.uninstalls.borrow_mut().push(name.to_string());
        self.kernels.borrow_mut().remove(name);
        Ok(())
    }
}
