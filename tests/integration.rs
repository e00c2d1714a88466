use std::cell::RefCell;

use cmdwrap::config::{Config, ConfigError, Loader, Schema, Value, ValueKind};
use cmdwrap::lifecycle::{
    CommandSet, Context, ErrorHandler, Execution, Lifecycle, LifecycleError, Outcome, Procedure,
    State,
};
use cmdwrap::load_config;
use cmdwrap::runner::DirectRunner;

fn write_config(dir: &std::path::Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
}

/// Creates a directory, writes a file into it and lists it
struct Scaffold {
    listed: RefCell<Option<String>>,
}

impl Scaffold {
    fn new() -> Self {
        Scaffold {
            listed: RefCell::new(None),
        }
    }
}

impl Procedure for Scaffold {
    fn commands(&self) -> CommandSet {
        CommandSet::new()
            .with("mkdir", "mkdir {directory}")
            .with("touch", "cd {directory} && touch {files}")
            .with("list", "ls {directory}")
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .optional("directory", "dotfiles")
            .required("files", ValueKind::List)
    }

    fn run(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        ctx.command("mkdir")?;
        ctx.command("touch")?;
        let listing = ctx.command("list")?;
        *self.listed.borrow_mut() = Some(listing.output.stdout);
        Ok(())
    }

    fn handle_error(&self, _command: &str, stderr: &str) -> bool {
        stderr.contains("File exists")
    }
}

#[test]
fn test_load_config_yaml() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "cfg.yaml", "directory: dotfiles\nfiles:\n  - a\n");
    let config = load_config("cfg", Some(dir.path()), &Schema::new()).unwrap();
    assert_eq!(config.get_str("directory"), Some("dotfiles"));
    assert_eq!(config["files"], Value::from(vec!["a"]));
}

#[test]
fn test_load_config_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_config("cfg", Some(dir.path()), &Schema::new());
    match result {
        Err(ConfigError::ConfigNotFound { name, .. }) => assert_eq!(name, "cfg"),
        other => panic!("Expected ConfigNotFound, got: {other:?}"),
    }
}

#[test]
fn test_load_config_defaults_and_types() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "task.json", r#"{"files": ["a", "b"], "extra": 1}"#);
    let schema = Scaffold::new().schema();
    let config = load_config("task", Some(dir.path()), &schema).unwrap();
    assert_eq!(config.get_str("directory"), Some("dotfiles"));
    assert_eq!(config.get_integer("extra"), Some(1));

    write_config(dir.path(), "bad.toml", "files = \"a\"\n");
    let result = load_config("bad", Some(dir.path()), &schema);
    match result {
        Err(ConfigError::TypeMismatch {
            key,
            expected,
            actual,
        }) => {
            assert_eq!(key, "files");
            assert_eq!(expected, ValueKind::List);
            assert_eq!(actual, ValueKind::String);
        }
        other => panic!("Expected TypeMismatch, got: {other:?}"),
    }
}

#[test]
fn test_shell_lifecycle_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new().with("files", vec!["vimrc"]);
    let mut lifecycle = Lifecycle::new(Scaffold::new(), config)
        .unwrap()
        .with_working_dir(dir.path());

    assert_eq!(lifecycle.invoke().unwrap(), Outcome::Completed);
    assert!(dir.path().join("dotfiles/vimrc").exists());
    assert_eq!(
        lifecycle.procedure().listed.borrow().as_deref(),
        Some("vimrc\n")
    );
}

#[test]
fn test_shell_lifecycle_ignores_handled_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("dotfiles")).unwrap();
    let config = Config::new().with("files", vec!["vimrc"]);
    let mut lifecycle = Lifecycle::new(Scaffold::new(), config)
        .unwrap()
        .with_working_dir(dir.path());

    assert_eq!(lifecycle.invoke().unwrap(), Outcome::Completed);
    assert!(dir.path().join("dotfiles/vimrc").exists());
}

#[test]
fn test_shell_lifecycle_stops_on_unhandled_failure() {
    let dir = tempfile::tempdir().unwrap();
    // mkdir reports "File exists" and is ignored, then cd fails with "Not a directory"
    std::fs::write(dir.path().join("dotfiles"), "").unwrap();
    let config = Config::new().with("files", vec!["vimrc"]);
    let mut lifecycle = Lifecycle::new(Scaffold::new(), config)
        .unwrap()
        .with_working_dir(dir.path());

    let result = lifecycle.invoke();
    match result {
        Err(LifecycleError::CommandFailed { command, status, .. }) => {
            assert_eq!(command, "cd dotfiles && touch vimrc");
            assert_ne!(status, 0);
        }
        other => panic!("Expected CommandFailed, got: {other:?}"),
    }
    assert_eq!(lifecycle.state(), State::Failed);
    assert!(lifecycle.procedure().listed.borrow().is_none());
}

/// Declares a handler for a specific exit status
struct Grep;

impl Grep {
    fn no_match(&self, execution: &Execution) -> bool {
        execution.output.stdout.is_empty()
    }
}

impl Procedure for Grep {
    fn commands(&self) -> CommandSet {
        CommandSet::new().with("grep", "grep {-e patterns} {file}")
    }

    fn error_handlers(&self) -> Vec<ErrorHandler<Self>> {
        vec![ErrorHandler::new(Grep::no_match).command("grep").status(1)]
    }

    fn run(&self, ctx: &mut Context<'_, Self>) -> Result<(), LifecycleError> {
        ctx.command("grep").map(|_| ())
    }

    fn handle_error(&self, _command: &str, _stderr: &str) -> bool {
        false
    }
}

#[test]
fn test_direct_runner_with_status_handler() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("input.txt");
    std::fs::write(&file, "alpha\nbeta\n").unwrap();

    let config = Config::new()
        .with("patterns", vec!["gamma", "delta"])
        .with("file", file.to_string_lossy().to_string());
    let mut lifecycle = Lifecycle::new(Grep, config)
        .unwrap()
        .with_runner(DirectRunner);
    assert_eq!(lifecycle.invoke().unwrap(), Outcome::Completed);

    // status 2 (missing file) does not match the handler and falls back to handle_error
    let config = Config::new()
        .with("patterns", vec!["alpha"])
        .with("file", dir.path().join("missing.txt").to_string_lossy().to_string());
    let mut lifecycle = Lifecycle::new(Grep, config)
        .unwrap()
        .with_runner(DirectRunner);
    assert!(matches!(
        lifecycle.invoke(),
        Err(LifecycleError::CommandFailed { status: 2, .. })
    ));
}

#[test]
fn test_loader_feeds_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "scaffold.toml",
        "directory = \"conf\"\nfiles = [\"a\", \"b\"]\n",
    );
    let raw = Loader::new(dir.path()).load("scaffold").unwrap();
    let mut lifecycle = Lifecycle::new(Scaffold::new(), raw)
        .unwrap()
        .with_working_dir(dir.path());
    lifecycle.invoke().unwrap();
    assert!(dir.path().join("conf/a").exists());
    assert!(dir.path().join("conf/b").exists());
}
