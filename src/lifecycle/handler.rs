use regex_cache::LazyRegex;

use crate::config::{ConfigError, parse_regex};
use crate::lifecycle::context::Execution;

/// Handles failures matching a command name, a stderr pattern and/or an exit status.
///
/// Criteria left unset match anything. The callback returns `true` to ignore the failure.
pub struct ErrorHandler<P> {
    command: Option<String>,
    error: Option<String>,
    status: Option<i32>,
    callback: fn(&P, &Execution) -> bool,
}

impl<P> ErrorHandler<P> {
    #[must_use]
    pub fn new(callback: fn(&P, &Execution) -> bool) -> Self {
        Self {
            command: None,
            error: None,
            status: None,
            callback,
        }
    }

    /// Only match failures of the named command template.
    #[must_use]
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    /// Only match failures whose stderr contains a match for `pattern`.
    #[must_use]
    pub fn error(mut self, pattern: impl Into<String>) -> Self {
        self.error = Some(pattern.into());
        self
    }

    /// Only match failures with this exit status.
    #[must_use]
    pub fn status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn compile(self) -> Result<CompiledHandler<P>, ConfigError> {
        let error = self.error.as_deref().map(parse_regex).transpose()?;
        Ok(CompiledHandler {
            command: self.command,
            error,
            status: self.status,
            callback: self.callback,
        })
    }
}

pub(crate) struct CompiledHandler<P> {
    command: Option<String>,
    error: Option<LazyRegex>,
    status: Option<i32>,
    callback: fn(&P, &Execution) -> bool,
}

impl<P> CompiledHandler<P> {
    pub(crate) fn matches(&self, execution: &Execution) -> bool {
        if let Some(command) = &self.command
            && execution.name.as_deref() != Some(command.as_str())
        {
            return false;
        }
        if let Some(pattern) = &self.error
            && !pattern.is_match(&execution.output.stderr)
        {
            return false;
        }
        self.status
            .is_none_or(|status| status == execution.output.status)
    }

    pub(crate) fn handle(&self, procedure: &P, execution: &Execution) -> bool {
        (self.callback)(procedure, execution)
    }
}
