//! Process execution
//!
//! A [`Runner`] takes a fully rendered command line and reports how it went. The lifecycle never
//! spawns processes itself, which keeps it testable with in-memory runners.

use std::io;
use std::path::Path;
use std::process::{Command as ProcessCommand, Output as ProcessOutput};

use log::debug;

/// Captured result of a single command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Output {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Output {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

impl From<ProcessOutput> for Output {
    /// Output is decoded lossily. A process killed by a signal reports status -1.
    fn from(output: ProcessOutput) -> Self {
        Output {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes rendered command lines
pub trait Runner {
    /// Run `command` to completion, in `cwd` when given.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command could not be started. A command that starts and
    /// fails is reported through [`Output::status`].
    fn run(&mut self, command: &str, cwd: Option<&Path>) -> io::Result<Output>;
}

/// Runs commands through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellRunner {
    #[must_use]
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Runner for ShellRunner {
    fn run(&mut self, command: &str, cwd: Option<&Path>) -> io::Result<Output> {
        debug!("Running '{command}' with {}", self.shell);
        let mut process = ProcessCommand::new(&self.shell);
        process.arg("-c").arg(command);
        if let Some(cwd) = cwd {
            process.current_dir(cwd);
        }
        Ok(process.output()?.into())
    }
}

/// Splits the command line with shell quoting rules and runs the program directly, without a
/// shell in between
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRunner;

impl Runner for DirectRunner {
    fn run(&mut self, command: &str, cwd: Option<&Path>) -> io::Result<Output> {
        let words = shell_words::split(command)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let (program, args) = words
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
        debug!("Running '{command}'");
        let mut process = ProcessCommand::new(program);
        process.args(args);
        if let Some(cwd) = cwd {
            process.current_dir(cwd);
        }
        Ok(process.output()?.into())
    }
}

/// Adapts a closure into a [`Runner`], see [`from_fn`]
pub struct FnRunner<F>(F);

impl<F> Runner for FnRunner<F>
where
    F: FnMut(&str) -> Output,
{
    fn run(&mut self, command: &str, _cwd: Option<&Path>) -> io::Result<Output> {
        Ok((self.0)(command))
    }
}

/// Build a runner from a closure mapping a command line to its output.
#[must_use]
pub fn from_fn<F>(f: F) -> FnRunner<F>
where
    F: FnMut(&str) -> Output,
{
    FnRunner(f)
}
