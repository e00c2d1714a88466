use crate::config::Schema;
use crate::lifecycle::LifecycleError;
use crate::lifecycle::context::Context;
use crate::lifecycle::handler::ErrorHandler;

/// Ordered set of named command templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    templates: Vec<(String, String)>,
}

impl CommandSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Declare a template. Redeclaring a name replaces its template in place.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        let name = name.into();
        let template = template.into();
        match self.templates.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = template,
            None => self.templates.push((name, template)),
        }
        self
    }

    /// Layer `other` on top of this set, overriding templates with the same name.
    #[must_use]
    pub fn merge(self, other: CommandSet) -> Self {
        other
            .templates
            .into_iter()
            .fold(self, |set, (name, template)| set.with(name, template))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// A statically configured command procedure.
///
/// Only [`Procedure::commands`], [`Procedure::run`] and [`Procedure::handle_error`] have to be
/// provided. Every other hook is optional and does nothing unless overridden:
///
/// 1. [`Procedure::skip`] gates the procedure; returning `true` aborts before anything runs
/// 2. [`Procedure::before`] runs for its side effects
/// 3. [`Procedure::run`] issues commands through the [`Context`]
/// 4. [`Procedure::after`] runs once `run` has succeeded
///
/// Hooks take `&self`, so a procedure that records state across hooks needs interior mutability.
pub trait Procedure: Sized {
    /// Named command templates, rendered against the resolved configuration.
    fn commands(&self) -> CommandSet;

    /// Expected configuration entries, checked once when the lifecycle is built.
    fn schema(&self) -> Schema {
        Schema::new()
    }

    /// Handlers for specific failures, tried before [`Procedure::handle_error`].
    fn error_handlers(&self) -> Vec<ErrorHandler<Self>> {
        Vec::new()
    }

    /// Return `true` to skip the procedure.
    ///
    /// # Errors
    ///
    /// Any error aborts the lifecycle.
    fn skip(&self, _ctx: &mut Context<'_, Self>) -> Result<bool, LifecycleError> {
        Ok(false)
    }

    /// # Errors
    ///
    /// Any error aborts the lifecycle before `run`.
    fn before(&self, _ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Describe the procedure.
    ///
    /// # Errors
    ///
    /// Usually a propagated failure of one of the issued commands.
    fn run(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError>;

    /// Called for every failed command that no matching [`ErrorHandler`] took care of.
    /// Return `true` to ignore the failure and continue, `false` to abort.
    fn handle_error(&self, command: &str, stderr: &str) -> bool;

    /// # Errors
    ///
    /// Any error is propagated to the caller.
    fn after(&self, _ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        Ok(())
    }
}
