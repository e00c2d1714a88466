//! Command template rendering
//!
//! A template is a command line with `{key}` placeholders that are filled from a [`Config`].
//! Rendering follows a few rules tuned for building command lines:
//!
//! - strings and numbers are inserted as is, lists are joined with a single space
//! - `true` becomes `--key-name` (lowercased, underscores replaced with dashes), `false` is dropped
//! - empty strings, empty lists and nulls are dropped, `0` is kept
//! - `{-o key}` prefixes the value with the flag `-o`, once per element for lists
//! - `{{` and `}}` are literal braces
//!
//! Dropped values would leave gaps, so whitespace runs in the result collapse to a single space.

use thiserror::Error;

use crate::config::{Config, Value, ValueKind};

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("No value for placeholder '{key}' in template '{template}'")]
    MissingValue { key: String, template: String },
    #[error("Invalid template '{template}' at position {position}: {message}")]
    Syntax {
        template: String,
        position: usize,
        message: &'static str,
    },
    #[error("Placeholder '{key}' refers to a {kind} value, which cannot be rendered")]
    Unrenderable { key: String, kind: ValueKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    flag: Option<String>,
    key: String,
}

/// A parsed command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Syntax` for unbalanced braces or empty placeholders.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let syntax = |position, message| TemplateError::Syntax {
            template: source.to_string(),
            position,
            message,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(syntax(pos, "single '}' encountered")),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(syntax(inner_pos, "unexpected '{' in placeholder")),
                            _ => body.push(inner),
                        }
                    }
                    if !closed {
                        return Err(syntax(pos, "unclosed placeholder"));
                    }
                    let field = Field::parse(&body).ok_or_else(|| syntax(pos, "empty placeholder"))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Configuration keys referenced by this template, in order of appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(field) => Some(field.key.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fill every placeholder from `config`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::MissingValue` if a referenced key is absent, or
    /// `TemplateError::Unrenderable` if it holds a table.
    pub fn render(&self, config: &Config) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value = config
                        .get(&field.key)
                        .ok_or_else(|| TemplateError::MissingValue {
                            key: field.key.clone(),
                            template: self.source.clone(),
                        })?;
                    out.push_str(&field.render(value)?);
                }
            }
        }
        Ok(out.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

impl Field {
    /// `key` or `-flag key [ignored...]`
    fn parse(body: &str) -> Option<Self> {
        let body = body.trim();
        if body.starts_with('-') {
            let mut words = body.split_whitespace();
            let flag = words.next()?;
            let key = words.next()?;
            Some(Field {
                flag: Some(flag.to_string()),
                key: key.to_string(),
            })
        } else if body.is_empty() {
            None
        } else {
            Some(Field {
                flag: None,
                key: body.to_string(),
            })
        }
    }

    fn render(&self, value: &Value) -> Result<String, TemplateError> {
        let with_flag = |text: String| match &self.flag {
            Some(flag) => format!("{flag} {text}"),
            None => text,
        };

        Ok(match value {
            Value::Table(_) => {
                return Err(TemplateError::Unrenderable {
                    key: self.key.clone(),
                    kind: value.kind(),
                });
            }
            v if v.is_empty() => String::new(),
            Value::Bool(_) => with_flag(format!("--{}", self.key.to_lowercase().replace('_', "-"))),
            Value::List(items) => items
                .iter()
                .map(|item| with_flag(item.to_string()))
                .collect::<Vec<_>>()
                .join(" "),
            other => with_flag(other.to_string()),
        })
    }
}

/// Parse and render `template` in one step.
///
/// # Errors
///
/// Returns any parse or render error, see [`Template::parse`] and [`Template::render`].
pub fn render(template: &str, config: &Config) -> Result<String, TemplateError> {
    Template::parse(template)?.render(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config::new()
            .with("option0", "test_option")
            .with("option1", "test_option1")
            .with("option2", vec!["test_path"])
    }

    #[test]
    fn test_simple_substitution() {
        let config = Config::new().with("directory", "dotfiles");
        assert_eq!(render("mkdir {directory}", &config).unwrap(), "mkdir dotfiles");
    }

    #[test]
    fn test_list_joined_with_spaces() {
        let config = base().with("option2", vec!["path0", "path1"]);
        assert_eq!(
            render("command {option0}::{option1} {option2}", &config).unwrap(),
            "command test_option::test_option1 path0 path1"
        );
    }

    #[test]
    fn test_boolean_flags() {
        let cases = [
            ("verbose", true, "command test_option::test_option1 test_path --verbose"),
            ("bool_option", true, "command test_option::test_option1 test_path --bool-option"),
            ("verbose", false, "command test_option::test_option1 test_path"),
        ];
        for (key, value, expected) in cases {
            let config = base().with(key, value);
            let template = format!("command {{option0}}::{{option1}} {{option2}} {{{key}}}");
            assert_eq!(render(&template, &config).unwrap(), expected);
        }
    }

    #[test]
    fn test_flag_placeholders() {
        let cases = [
            ("init {option0} {-e keyfile}", Config::new().with("option0", "repo").with("keyfile", "key"), "init repo -e key"),
            ("command {-e list}", Config::new().with("list", vec!["/a", "/b"]), "command -e /a -e /b"),
            ("command {-e list}", Config::new().with("list", Vec::<String>::new()), "command"),
            ("command {-c empty}", Config::new().with("empty", ""), "command"),
            ("command {-h keep_hourly}", Config::new().with("keep_hourly", 1), "command -h 1"),
            ("command {-o arg}", Config::new().with("arg", 0), "command -o 0"),
            ("command {--long opt}", Config::new().with("opt", vec![1, 2, 3]), "command --long 1 --long 2 --long 3"),
            ("command {-o option option2}", Config::new().with("option", "opt"), "command -o opt"),
            ("command {ARG}", Config::new().with("ARG", 10), "command 10"),
        ];
        for (template, config, expected) in cases {
            assert_eq!(render(template, &config).unwrap(), expected, "{template}");
        }
    }

    #[test]
    fn test_escaped_braces() {
        let config = Config::new().with("name", "world");
        assert_eq!(
            render("awk '{{print $1}}' {name}", &config).unwrap(),
            "awk '{print $1}' world"
        );
    }

    #[test]
    fn test_missing_value() {
        let err = render("rm {target}", &Config::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingValue {
                key: "target".into(),
                template: "rm {target}".into(),
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        for template in ["echo {unclosed", "echo }", "echo {}", "echo {a{b}}"] {
            assert!(
                matches!(Template::parse(template), Err(TemplateError::Syntax { .. })),
                "{template}"
            );
        }
    }

    #[test]
    fn test_table_is_unrenderable() {
        let config: Config = serde_json::from_str(r#"{"opts": {"a": 1}}"#).unwrap();
        let err = render("cmd {opts}", &config).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Placeholder 'opts' refers to a table value, which cannot be rendered");
    }

    #[test]
    fn test_keys_in_order() {
        let template = Template::parse("borg create {-e exclude} {repo}::{name} {paths}").unwrap();
        assert_eq!(
            template.keys().collect::<Vec<_>>(),
            vec!["exclude", "repo", "name", "paths"]
        );
    }

    #[test]
    fn test_render_reflects_config() {
        let template = Template::parse("command {OPTION}").unwrap();
        let config = Config::new().with("OPTION", "option");
        assert_eq!(template.render(&config).unwrap(), "command option");
        let config = config.with("OPTION", "changed");
        assert_eq!(template.render(&config).unwrap(), "command changed");
    }
}
