//! Wrap shell commands in statically configured procedures
//!
//! A procedure declares named command templates such as `mkdir {directory}`, the configuration
//! entries it expects, and a handful of lifecycle hooks. Configuration is read from a JSON, YAML or
//! TOML file, checked against the procedure's schema, and used to render every command before it
//! is handed to a runner. Failed commands go through the procedure's error handlers, which decide
//! whether the procedure continues or stops.
//!
//! ```no_run
//! use cmdwrap::config::{Config, Schema, ValueKind};
//! use cmdwrap::lifecycle::{CommandSet, Context, Lifecycle, LifecycleError, Procedure};
//!
//! struct Dotfiles;
//!
//! impl Procedure for Dotfiles {
//!     fn commands(&self) -> CommandSet {
//!         CommandSet::new()
//!             .with("mkdir", "mkdir -p {directory}")
//!             .with("clone", "git clone {repository} {directory}")
//!     }
//!
//!     fn schema(&self) -> Schema {
//!         Schema::new()
//!             .required("repository", ValueKind::String)
//!             .optional("directory", "dotfiles")
//!     }
//!
//!     fn run(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
//!         ctx.command("mkdir")?;
//!         ctx.command("clone")?;
//!         Ok(())
//!     }
//!
//!     fn handle_error(&self, _command: &str, stderr: &str) -> bool {
//!         stderr.contains("already exists")
//!     }
//! }
//!
//! let config = Config::new().with("repository", "https://example.com/dotfiles.git");
//! Lifecycle::new(Dotfiles, config)?
//!     .with_working_dir("/home/user")
//!     .invoke()?;
//! # Ok::<(), LifecycleError>(())
//! ```

use std::path::Path;

use log::debug;

use crate::config::{Config, ConfigError, Loader, Schema};

pub mod backup;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod logger;
pub mod runner;
pub mod template;

/// Load the configuration file for `name` and resolve it against `schema`.
///
/// `dir` defaults to the current working directory.
///
/// # Errors
///
/// Returns `ConfigError` if the file is not found, cannot be parsed, or does not satisfy the
/// schema.
pub fn load_config(name: &str, dir: Option<&Path>, schema: &Schema) -> Result<Config, ConfigError> {
    let loader = match dir {
        Some(dir) => Loader::new(dir),
        None => Loader::current_dir()?,
    };
    debug!("Loading config '{name}' from {}", loader.dir().display());
    let raw = loader.load(name)?;
    schema.check(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Value, ValueKind};

    #[test]
    fn test_load_then_check() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("task.yaml"), "---\ntest_entry: ok\n").unwrap();
        let schema = Schema::new().optional("option", "a");
        let config = load_config("task", Some(dir.path()), &schema).unwrap();
        assert_eq!(config.get("option"), Some(&Value::from("a")));
        assert_eq!(config.get("test_entry"), Some(&Value::from("ok")));
    }

    #[test]
    fn test_check_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("task.toml"), "test_entry = 1\n").unwrap();
        let schema = Schema::new().required("test_entry", ValueKind::String);
        let result = load_config("task", Some(dir.path()), &schema);
        assert!(matches!(result, Err(ConfigError::TypeMismatch { .. })));
    }
}
