//! Logger for wrapper programs
//!
//! Lines look like `backup[4242] nightly: INFO: Running pre-backup scripts` and go to stdout,
//! and to a log file when one is given. The level comes from `RUST_LOG` and defaults to `info`.

use std::fs::File;
use std::io::Write;

use log::{Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

struct TaskLogger {
    program: String,
    task: String,
    pid: u32,
    file: Option<Mutex<File>>,
    filter: log::LevelFilter,
}

impl TaskLogger {
    fn format(&self, record: &Record) -> String {
        format_line(
            &self.program,
            self.pid,
            &self.task,
            record.level(),
            &record.args().to_string(),
        )
    }
}

fn format_line(program: &str, pid: u32, task: &str, level: log::Level, message: &str) -> String {
    format!("{program}[{pid}] {task}: {level}: {message}")
}

impl Log for TaskLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record);
        let _ = writeln!(std::io::stdout().lock(), "{line}");

        if let Some(ref file) = self.file {
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Install the global logger, tagging every line with the program and task name.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger has already been installed.
pub fn init(program: &str, task: &str, log_file: Option<File>) -> Result<(), SetLoggerError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Info);

    let logger = TaskLogger {
        program: program.to_string(),
        task: task.to_string(),
        pid: std::process::id(),
        file: log_file.map(Mutex::new),
        filter,
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let line = format_line("backup", 42, "nightly", log::Level::Warn, "disk almost full");
        assert_eq!(line, "backup[42] nightly: WARN: disk almost full");
    }

    #[test]
    fn test_second_init_is_an_error() {
        // the global logger may already be set, only the second call is certain to fail
        let _ = init("backup", "nightly", None);
        assert!(init("backup", "nightly", None).is_err());
    }
}
