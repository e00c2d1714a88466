//! Static configuration for procedures
//!
//! A configuration is a flat mapping of string keys to [`Value`]s. It is usually read from a
//! `<task>.json`, `<task>.yaml` or `<task>.toml` file by the [`Loader`] and then resolved against
//! a [`Schema`], which fills in defaults and checks the type of every declared entry.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Index;
use std::path::PathBuf;

use regex_cache::LazyRegex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod loader;
pub mod schema;
pub mod value;

pub use loader::{Format, Loader};
pub use schema::{Entry, Schema};
pub use value::{Value, ValueKind};

/// Errors that can occur while loading or checking configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find configuration file for task '{name}' in {dir}")]
    ConfigNotFound { name: String, dir: PathBuf },
    #[error("No such directory: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Could not load configuration file {0}, unknown format")]
    UnknownFormat(PathBuf),
    #[error("Unable to read config file {path}: {source}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse TOML config file {path}: {source}")]
    Toml {
        source: toml::de::Error,
        path: PathBuf,
    },
    #[error("Missing required configuration entries: {}", .0.join(", "))]
    MissingEntry(Vec<String>),
    #[error("'{key}' must be of type '{expected}' not '{actual}'")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("Invalid regex pattern `{pattern}`: {source}")]
    Regex {
        source: regex::Error,
        pattern: String,
    },
}

/// Compile a regex pattern used for error matching.
///
/// # Errors
///
/// Returns `ConfigError::Regex` if the pattern fails to compile.
pub fn parse_regex(pattern: &str) -> Result<LazyRegex, ConfigError> {
    LazyRegex::new(pattern).map_err(|e| ConfigError::Regex {
        source: e,
        pattern: pattern.to_string(),
    })
}

/// A string keyed configuration mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, Value>);

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert, mostly useful for assembling a raw configuration in code.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_integer)
    }

    #[must_use]
    pub fn get_list(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_list)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &str) -> &Value {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Config(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for Config {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Config(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_accessors() {
        let config = Config::new().with("option", "test_entry");
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["option"]);
        assert_eq!(
            config.values().collect::<Vec<_>>(),
            vec![&Value::from("test_entry")]
        );
        assert_eq!(config["option"], Value::from("test_entry"));
        assert_eq!(config.get_str("option"), Some("test_entry"));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_regex_error_preserves_pattern() {
        match parse_regex("[invalid") {
            Err(ConfigError::Regex { pattern, .. }) => assert_eq!(pattern, "[invalid"),
            other => panic!("Expected ConfigError::Regex, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_entry_message() {
        let err = ConfigError::MissingEntry(vec!["paths".into(), "email_to".into()]);
        insta::assert_snapshot!(err.to_string(), @"Missing required configuration entries: paths, email_to");
    }
}
