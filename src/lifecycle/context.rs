use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::Config;
use crate::lifecycle::LifecycleError;
use crate::lifecycle::handler::CompiledHandler;
use crate::lifecycle::procedure::Procedure;
use crate::runner::{Output, Runner};
use crate::template::Template;

/// A command that has been issued, with its captured output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Name of the command template, `None` for ad-hoc scripts
    pub name: Option<String>,
    pub command: String,
    pub output: Output,
}

/// Handle given to procedure hooks for reading configuration and issuing commands
pub struct Context<'a, P> {
    pub(crate) procedure: &'a P,
    pub(crate) config: &'a Config,
    pub(crate) commands: &'a [(String, Template)],
    pub(crate) handlers: &'a [CompiledHandler<P>],
    pub(crate) runner: &'a mut dyn Runner,
    pub(crate) working_dir: Option<&'a Path>,
    pub(crate) dry_run: bool,
}

impl<P: Procedure> Context<'_, P> {
    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.config
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Render the named command template without running it.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::UnknownCommand` if no template has that name.
    pub fn render(&self, name: &str) -> Result<String, LifecycleError> {
        let template = self
            .commands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| LifecycleError::UnknownCommand(name.to_string()))?;
        Ok(template.render(self.config)?)
    }

    /// Render and run the named command template.
    ///
    /// A failed command goes through the matching error handlers, or the procedure's
    /// `handle_error` when none match. An ignored failure is returned as a normal execution.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::CommandFailed` for a failure that was not ignored, or an error if
    /// the template is unknown or the command could not be started.
    pub fn command(&mut self, name: &str) -> Result<Execution, LifecycleError> {
        let command = self.render(name)?;
        let execution = self.execute(Some(name), command)?;
        if execution.output.is_success() {
            return Ok(execution);
        }

        if self.is_ignored(&execution) {
            warn!(
                "Ignoring failure of '{}' (status {}): {}",
                execution.command,
                execution.output.status,
                execution.output.stderr.trim()
            );
            Ok(execution)
        } else {
            Err(unhandled(execution))
        }
    }

    /// Run an ad-hoc command line that is not one of the declared templates.
    ///
    /// Error handlers are not consulted, a failure always aborts.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::CommandFailed` if the command fails.
    pub fn script(&mut self, line: &str) -> Result<Execution, LifecycleError> {
        let execution = self.execute(None, line.to_string())?;
        if execution.output.is_success() {
            Ok(execution)
        } else {
            Err(unhandled(execution))
        }
    }

    fn execute(&mut self, name: Option<&str>, command: String) -> Result<Execution, LifecycleError> {
        let output = if self.dry_run {
            info!("Dry run: {command}");
            Output::default()
        } else {
            debug!("Running '{command}'");
            self.runner
                .run(&command, self.working_dir)
                .map_err(|e| LifecycleError::Spawn {
                    command: command.clone(),
                    source: e,
                })?
        };
        debug!("'{command}' exited with status {}", output.status);
        Ok(Execution {
            name: name.map(str::to_string),
            command,
            output,
        })
    }

    fn is_ignored(&self, execution: &Execution) -> bool {
        let mut matching = self
            .handlers
            .iter()
            .filter(|h| h.matches(execution))
            .peekable();
        if matching.peek().is_none() {
            return self
                .procedure
                .handle_error(&execution.command, &execution.output.stderr);
        }
        matching.all(|h| h.handle(self.procedure, execution))
    }
}

fn unhandled(execution: Execution) -> LifecycleError {
    error!(
        "Unhandled error: {}: {}",
        execution.command,
        execution.output.stderr.trim()
    );
    LifecycleError::CommandFailed {
        command: execution.command,
        status: execution.output.status,
        stderr: execution.output.stderr,
    }
}
