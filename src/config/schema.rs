use log::debug;

use crate::config::{Config, ConfigError, Value, ValueKind};

/// What a schema declares for a single configuration key
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// The key must be present and hold a value of this kind
    Required(ValueKind),
    /// The key may be omitted; the default's kind is the expected kind
    Default(Value),
}

impl Entry {
    #[must_use]
    pub fn expected(&self) -> ValueKind {
        match self {
            Entry::Required(kind) => *kind,
            Entry::Default(value) => value.kind(),
        }
    }
}

/// Ordered declaration of expected configuration entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entries: Vec<(String, Entry)>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.entry(key, Entry::Required(kind))
    }

    #[must_use]
    pub fn optional(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry(key, Entry::Default(value.into()))
    }

    /// Declare an entry. Redeclaring a key replaces it in place.
    #[must_use]
    pub fn entry(mut self, key: impl Into<String>, entry: Entry) -> Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
        self
    }

    /// Layer `other` on top of this schema.
    ///
    /// Keys declared by both keep their position here but take the entry from `other`.
    #[must_use]
    pub fn merge(self, other: Schema) -> Self {
        other
            .entries
            .into_iter()
            .fold(self, |schema, (key, entry)| schema.entry(key, entry))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a raw configuration against this schema.
    ///
    /// Present entries are type checked, absent entries with a default are filled in, and
    /// keys the schema does not mention are kept untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TypeMismatch` for the first entry (in schema order) whose value has
    /// the wrong kind, or `ConfigError::MissingEntry` listing every absent required key.
    pub fn check(&self, raw: Config) -> Result<Config, ConfigError> {
        debug!("Checking config: {raw:?}");
        let mut resolved = raw;
        let mut missing = Vec::new();

        for (key, entry) in &self.entries {
            match resolved.get(key) {
                Some(value) => {
                    let expected = entry.expected();
                    if value.kind() != expected {
                        return Err(ConfigError::TypeMismatch {
                            key: key.clone(),
                            expected,
                            actual: value.kind(),
                        });
                    }
                }
                None => match entry {
                    Entry::Default(value) => {
                        resolved.insert(key.clone(), value.clone());
                    }
                    Entry::Required(_) => missing.push(key.clone()),
                },
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingEntry(missing));
        }
        Ok(resolved)
    }
}
