//! Reusable backup procedure
//!
//! [`Backup`] takes care of what most backup jobs share: it skips disabled tasks, runs only
//! within the allowed hours and not too soon after the previous backup, and runs pre and post
//! backup scripts around the actual work. The tool specific part (borg, rsync, ...) lives in a
//! [`BackupTool`].
//!
//! Recognised configuration:
//!
//! | key                | type    | default  |
//! |--------------------|---------|----------|
//! | `allowed_hours`    | list    | required |
//! | `disabled`         | boolean | `false`  |
//! | `exclude`          | list    | `[]`     |
//! | `minimum_interval` | integer | required |
//! | `paths`            | list    | required |
//! | `verbose`          | boolean | `false`  |
//! | `pre_scripts`      | list    | required |
//! | `post_scripts`     | list    | required |

use chrono::{DateTime, Local, TimeDelta, Timelike};
use log::info;

use crate::config::{ConfigError, Schema, Value, ValueKind};
use crate::lifecycle::{CommandSet, Context, LifecycleError, Procedure};

/// Entries shared by every backup task.
#[must_use]
pub fn schema() -> Schema {
    Schema::new()
        .required("allowed_hours", ValueKind::List)
        .optional("disabled", false)
        .optional("exclude", Vec::<Value>::new())
        .required("minimum_interval", ValueKind::Integer)
        .required("paths", ValueKind::List)
        .optional("verbose", false)
        .required("pre_scripts", ValueKind::List)
        .required("post_scripts", ValueKind::List)
}

/// The tool specific half of a backup procedure
pub trait BackupTool: Sized {
    fn commands(&self) -> CommandSet;

    /// Additional configuration entries, layered over [`schema`].
    fn schema(&self) -> Schema {
        Schema::new()
    }

    /// When the last backup finished, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Any error aborts the backup.
    fn last_backup_time(
        &self,
        ctx: &mut Context<'_, Backup<Self>>,
    ) -> Result<Option<DateTime<Local>>, LifecycleError>;

    /// # Errors
    ///
    /// Usually a propagated command failure.
    fn backup(&self, ctx: &mut Context<'_, Backup<Self>>) -> Result<(), LifecycleError>;

    fn handle_error(&self, command: &str, stderr: &str) -> bool;
}

pub struct Backup<T> {
    tool: T,
    clock: fn() -> DateTime<Local>,
}

impl<T: BackupTool> Backup<T> {
    #[must_use]
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            clock: Local::now,
        }
    }

    /// Replace the source of the current time.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    fn is_bad_time(&self, ctx: &Context<'_, Self>) -> bool {
        let hour = i64::from((self.clock)().hour());
        !ctx.config()
            .get_list("allowed_hours")
            .unwrap_or_default()
            .iter()
            .any(|h| h.as_integer() == Some(hour))
    }

    fn has_recent_backup(&self, ctx: &mut Context<'_, Self>) -> Result<bool, LifecycleError> {
        let Some(last) = self.tool.last_backup_time(ctx)? else {
            return Ok(false);
        };
        let interval = ctx.config().get_integer("minimum_interval").unwrap_or(0);
        let interval = TimeDelta::try_seconds(interval).unwrap_or(TimeDelta::MAX);
        Ok((self.clock)() - last < interval)
    }

    fn run_scripts(ctx: &mut Context<'_, Self>, key: &str) -> Result<(), LifecycleError> {
        let scripts = ctx
            .config()
            .get_list(key)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, script)| {
                script
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::TypeMismatch {
                        key: format!("{key}[{i}]"),
                        expected: ValueKind::String,
                        actual: script.kind(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        for script in &scripts {
            let execution = ctx.script(script)?;
            log::debug!("Output: {}", execution.output.stdout.trim());
        }
        Ok(())
    }
}

impl<T: BackupTool> Procedure for Backup<T> {
    fn commands(&self) -> CommandSet {
        self.tool.commands()
    }

    fn schema(&self) -> Schema {
        schema().merge(self.tool.schema())
    }

    fn skip(&self, ctx: &mut Context<'_, Self>) -> Result<bool, LifecycleError> {
        if ctx.config().get_bool("disabled").unwrap_or(false) {
            info!("Backup task is disabled...");
            return Ok(true);
        }
        if self.is_bad_time(ctx) {
            info!("Not yet time to backup...");
            return Ok(true);
        }
        if self.has_recent_backup(ctx)? {
            info!("There was a recent backup, aborting...");
            return Ok(true);
        }
        Ok(false)
    }

    fn before(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        info!("Running pre-backup scripts...");
        Self::run_scripts(ctx, "pre_scripts")
    }

    fn run(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        self.tool.backup(ctx)
    }

    fn handle_error(&self, command: &str, stderr: &str) -> bool {
        self.tool.handle_error(command, stderr)
    }

    fn after(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        info!("Running post-backup scripts...");
        Self::run_scripts(ctx, "post_scripts")
    }
}
