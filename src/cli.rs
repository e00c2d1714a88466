//! Argument handling for programs wrapping a single procedure
//!
//! ```no_run
//! # use cmdwrap::cli::TaskArgs;
//! # use cmdwrap::lifecycle::{CommandSet, Context, LifecycleError, Procedure};
//! # struct Mirror;
//! # impl Procedure for Mirror {
//! #     fn commands(&self) -> CommandSet { CommandSet::new() }
//! #     fn run(&self, _: &mut Context<'_, Self>) -> Result<(), LifecycleError> { Ok(()) }
//! #     fn handle_error(&self, _: &str, _: &str) -> bool { false }
//! # }
//! use clap::Parser;
//!
//! let args = TaskArgs::parse();
//! let mut lifecycle = args.build(Mirror)?;
//! lifecycle.invoke()?;
//! # Ok::<(), LifecycleError>(())
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::Loader;
use crate::lifecycle::{Lifecycle, LifecycleError, Procedure};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct TaskArgs {
    /// Name of the task (configuration file name without extension)
    #[arg(value_name = "TASK")]
    pub task: String,

    /// Directory holding the configuration file (defaults to the current directory)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Check without doing any changes
    #[arg(long)]
    pub dry_run: bool,
}

impl TaskArgs {
    /// Load `<task>.<ext>` and build a lifecycle for `procedure` from it.
    ///
    /// # Errors
    ///
    /// Returns any error from loading the configuration or constructing the lifecycle.
    pub fn build<P: Procedure>(&self, procedure: P) -> Result<Lifecycle<P>, LifecycleError> {
        let loader = match &self.config_path {
            Some(dir) => Loader::new(dir),
            None => Loader::current_dir()?,
        };
        let raw = loader.load(&self.task)?;
        Ok(Lifecycle::new(procedure, raw)?.dry_run(self.dry_run))
    }
}
