//! Command lifecycle
//!
//! A [`Lifecycle`] binds a [`Procedure`] to its resolved configuration and a [`Runner`], and
//! drives the hooks in a fixed order: gate, before, run, after. Commands are issued one at a
//! time and every failure is inspected before the next command is issued.
//!
//! A lifecycle is single use: it is built once and invoked once.

use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::runner::{Runner, ShellRunner};
use crate::template::{Template, TemplateError};

pub mod context;
pub mod handler;
pub mod procedure;

pub use context::{Context, Execution};
pub use handler::ErrorHandler;
pub use procedure::{CommandSet, Procedure};

use handler::CompiledHandler;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Unable to start '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command}: {}", .stderr.trim())]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Lifecycle has already been invoked")]
    AlreadyInvoked,
}

/// Where a lifecycle is in its single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Gated,
    Running,
    Completed,
    Failed,
    Aborted,
}

/// How a successful invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gate declined to run, no command was issued
    Aborted,
    Completed,
}

pub struct Lifecycle<P: Procedure> {
    procedure: P,
    config: Config,
    commands: Vec<(String, Template)>,
    handlers: Vec<CompiledHandler<P>>,
    runner: Box<dyn Runner>,
    working_dir: Option<PathBuf>,
    dry_run: bool,
    state: State,
}

impl<P: Procedure> Lifecycle<P> {
    /// Resolve `raw` against the procedure's schema and prepare its command templates.
    ///
    /// Commands run through [`ShellRunner`] unless another runner is set.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schema check fails or an error handler pattern is
    /// invalid, and a template error if a template is malformed or does not render against the
    /// resolved configuration.
    pub fn new(procedure: P, raw: Config) -> Result<Self, LifecycleError> {
        let config = procedure.schema().check(raw)?;
        debug!("Resolved config: {config:?}");

        let commands = procedure
            .commands()
            .iter()
            .map(|(name, source)| {
                let template = Template::parse(source)?;
                // config is fixed from here on, so a template that renders now renders later
                template.render(&config)?;
                Ok((name.to_string(), template))
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        let handlers = procedure
            .error_handlers()
            .into_iter()
            .map(handler::ErrorHandler::compile)
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Lifecycle {
            procedure,
            config,
            commands,
            handlers,
            runner: Box::new(ShellRunner::default()),
            working_dir: None,
            dry_run: false,
            state: State::Created,
        })
    }

    #[must_use]
    pub fn with_runner(mut self, runner: impl Runner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Run every command in `dir`. Without it commands inherit the process working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Log rendered commands instead of running them; they are treated as successful.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn procedure(&self) -> &P {
        &self.procedure
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Run the procedure.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::AlreadyInvoked` on a second call, otherwise the first error raised
    /// by a hook, typically an unhandled command failure. The lifecycle is then `Failed`.
    pub fn invoke(&mut self) -> Result<Outcome, LifecycleError> {
        if self.state != State::Created {
            return Err(LifecycleError::AlreadyInvoked);
        }

        let mut ctx = Context {
            procedure: &self.procedure,
            config: &self.config,
            commands: &self.commands,
            handlers: &self.handlers,
            runner: self.runner.as_mut(),
            working_dir: self.working_dir.as_deref(),
            dry_run: self.dry_run,
        };

        let result = drive(&self.procedure, &mut ctx, &mut self.state);
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }
}

fn drive<P: Procedure>(
    procedure: &P,
    ctx: &mut Context<'_, P>,
    state: &mut State,
) -> Result<Outcome, LifecycleError> {
    if procedure.skip(ctx)? {
        info!("Skipping procedure");
        *state = State::Aborted;
        return Ok(Outcome::Aborted);
    }
    *state = State::Gated;

    procedure.before(ctx)?;
    *state = State::Running;
    procedure.run(ctx)?;
    procedure.after(ctx)?;

    *state = State::Completed;
    Ok(Outcome::Completed)
}
