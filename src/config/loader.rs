use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{Config, ConfigError};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

/// Extensions tried when searching for a configuration file, in order
const EXTENSIONS: [(&str, Format); 4] = [
    ("json", Format::Json),
    ("yaml", Format::Yaml),
    ("yml", Format::Yaml),
    ("toml", Format::Toml),
];

impl Format {
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Format> {
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, format)| *format)
    }

    /// Decode `contents` into a configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns the format specific decoding error, tagged with `path`.
    pub fn parse(self, contents: &str, path: &Path) -> Result<Config, ConfigError> {
        match self {
            Format::Json => serde_json::from_str(contents).map_err(|e| ConfigError::Json {
                source: e,
                path: path.to_path_buf(),
            }),
            Format::Yaml if contents.trim().is_empty() => Ok(Config::new()),
            Format::Yaml => serde_yaml::from_str(contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: path.to_path_buf(),
            }),
            Format::Toml => toml::from_str(contents).map_err(|e| ConfigError::Toml {
                source: e,
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Finds and reads `<name>.<ext>` configuration files from a search directory
#[derive(Debug, Clone)]
pub struct Loader {
    dir: PathBuf,
}

impl Loader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A loader searching the current working directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DirectoryNotFound` if the cwd cannot be determined.
    pub fn current_dir() -> Result<Self, ConfigError> {
        let dir = std::env::current_dir()
            .map_err(|_| ConfigError::DirectoryNotFound(PathBuf::from(".")))?;
        Ok(Self::new(dir))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate the configuration file for `name`, trying each known extension in order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DirectoryNotFound` if the search directory does not exist,
    /// `ConfigError::UnknownFormat` if the only candidate has an unsupported extension, or
    /// `ConfigError::ConfigNotFound` if there is no candidate at all. Callers treating "no
    /// configuration" as one case should match both `DirectoryNotFound` and `ConfigNotFound`.
    pub fn find(&self, name: &str) -> Result<(PathBuf, Format), ConfigError> {
        if !self.dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.dir.clone()));
        }
        debug!("Searching config files for '{name}' in {}", self.dir.display());

        for (ext, format) in &EXTENSIONS {
            let path = self.dir.join(format!("{name}.{ext}"));
            if path.is_file() {
                info!("Found config file: {}", path.display());
                return Ok((path, *format));
            }
        }

        if let Some(path) = self.find_unsupported(name) {
            return Err(ConfigError::UnknownFormat(path));
        }
        Err(ConfigError::ConfigNotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
        })
    }

    /// A `<name>.<ext>` file with a single extension; backups like `name.yaml.bak` don't count.
    fn find_unsupported(&self, name: &str) -> Option<PathBuf> {
        let prefix = format!("{name}.");
        std::fs::read_dir(&self.dir)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|f| f.to_str())
                        .and_then(|f| f.strip_prefix(&prefix))
                        .is_some_and(|ext| !ext.is_empty() && !ext.contains('.'))
            })
    }

    /// Load and decode the configuration file for `name`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Loader::find`], `ConfigError::Read` if the file cannot be read,
    /// or a decoding error if its content is malformed.
    pub fn load(&self, name: &str) -> Result<Config, ConfigError> {
        let (path, format) = self.find(name)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            source: e,
            path: path.clone(),
        })?;
        debug!("Loading configuration {} as {format:?}", path.display());
        format.parse(&contents, &path)
    }
}
