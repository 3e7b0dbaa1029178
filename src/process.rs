//! External command execution.
//!
//! Every tool nbenv drives (pyenv, venv, pip, jupyter, papermill) goes
//! through a [`Runner`], so tests can substitute a scripted fake.

use crate::error::{CommandFailure, NbenvError, Result};
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Verbosity levels for output.
/// - 0: quiet (warnings and errors only)
/// - 1: normal (-v, show commands)
/// - 2: verbose (-vv, show commands + output)
/// - 3+: debug (-vvv, show everything, pip runs with -vvv)
pub type Verbosity = u8;

/// A command line to execute: program, arguments and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Override one environment variable; everything else is inherited.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    /// Render for logs and error messages. Not shell-safe.
    pub fn render(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| {
                let part = part.to_string_lossy();
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Executes command lines to completion.
///
/// Implementations must return [`NbenvError::CommandFailed`] for a non-zero
/// exit and [`NbenvError::ToolNotFound`] when the program cannot be started.
pub trait Runner {
    fn run(&self, cmd: &CommandLine) -> Result<Captured>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, cmd: &CommandLine) -> Result<Captured> {
        (**self).run(cmd)
    }
}

/// Runs commands on the host with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &CommandLine) -> Result<Captured> {
        let rendered = cmd.render();
        tracing::info!(command = %rendered, "Executing");

        let output = match cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(program = %cmd.program().display(), "Executable not found");
                return Err(NbenvError::ToolNotFound(
                    cmd.program().display().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let captured = Captured {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !captured.stdout.is_empty() {
            tracing::debug!("stdout:\n{}", captured.stdout);
        }
        if !captured.stderr.is_empty() {
            tracing::debug!("stderr:\n{}", captured.stderr);
        }

        if !output.status.success() {
            tracing::warn!(command = %rendered, code = ?output.status.code(), "Command failed");
            return Err(NbenvError::CommandFailed(CommandFailure {
                command: rendered,
                exit_code: output.status.code(),
                output: captured.combined(),
            }));
        }

        Ok(captured)
    }
}
