//! Parser configuration.
//!
//! Options are plain booleans selecting the markdown dialect and a few
//! optional constructs. They can be built in code with the builder-style
//! setters or validated from a JSON object (as read from a config file or
//! the command line).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Characters that can be escaped with a backslash in every dialect.
const ESCAPES_DEFAULT: &[char] = &[
    '\\', '`', '*', '{', '}', '[', ']', '(', ')', '#', '+', '-', '.', '!', '_', '>',
];

/// GFM additionally allows escaping tildes and pipes.
const ESCAPES_GFM: &[char] = &[
    '\\', '`', '*', '{', '}', '[', ']', '(', ')', '#', '+', '-', '.', '!', '_', '>', '~', '|',
];

/// CommonMark allows escaping any ASCII punctuation and line endings.
const ESCAPES_COMMONMARK: &[char] = &[
    '\\', '`', '*', '{', '}', '[', ']', '(', ')', '#', '+', '-', '.', '!', '_', '>', '~', '|',
    '\n', '"', '$', '%', '&', '\'', ',', '/', ':', ';', '<', '=', '?', '@', '^',
];

const KEYS: [&str; 7] = [
    "gfm",
    "commonmark",
    "pedantic",
    "footnotes",
    "yaml",
    "breaks",
    "position",
];

/// Dialect and feature switches for a [`Parser`](crate::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// GitHub flavored markdown: fenced code, tables, deletion, bare URLs,
    /// task list items.
    pub gfm: bool,
    /// Follow CommonMark where it differs from the default dialect.
    pub commonmark: bool,
    /// Mimic the quirks of the original `markdown.pl`.
    pub pedantic: bool,
    /// Footnote definitions, references and inline footnotes.
    pub footnotes: bool,
    /// YAML front matter at the very start of a document.
    pub yaml: bool,
    /// Treat every line ending in a paragraph as a hard break.
    pub breaks: bool,
    /// Keep positional information on the returned tree.
    pub position: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gfm: true,
            commonmark: false,
            pedantic: false,
            footnotes: false,
            yaml: true,
            breaks: false,
            position: true,
        }
    }
}

impl Options {
    pub fn gfm(mut self, on: bool) -> Self {
        self.gfm = on;
        self
    }

    pub fn commonmark(mut self, on: bool) -> Self {
        self.commonmark = on;
        self
    }

    pub fn pedantic(mut self, on: bool) -> Self {
        self.pedantic = on;
        self
    }

    pub fn footnotes(mut self, on: bool) -> Self {
        self.footnotes = on;
        self
    }

    pub fn yaml(mut self, on: bool) -> Self {
        self.yaml = on;
        self
    }

    pub fn breaks(mut self, on: bool) -> Self {
        self.breaks = on;
        self
    }

    pub fn position(mut self, on: bool) -> Self {
        self.position = on;
        self
    }

    /// Build options from a JSON value, starting from the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use marktree_core::Options;
    ///
    /// let options = Options::from_json(&serde_json::json!({"commonmark": true})).unwrap();
    /// assert!(options.commonmark);
    /// assert!(options.gfm);
    ///
    /// assert!(Options::from_json(&serde_json::json!({"gfm": "yes"})).is_err());
    /// ```
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        Self::default().merge_json(value)
    }

    /// Apply the settings in `value` on top of these options.
    ///
    /// `null` leaves everything unchanged, as does a `null` setting. Any
    /// other non-boolean setting, an unknown key, or a value that is not an
    /// object is rejected.
    pub fn merge_json(mut self, value: &Value) -> Result<Self, ConfigError> {
        let map = match value {
            Value::Null => return Ok(self),
            Value::Object(map) => map,
            other => return Err(ConfigError::InvalidOptions(other.to_string())),
        };

        for (key, setting) in map {
            let slot = match key.as_str() {
                "gfm" => &mut self.gfm,
                "commonmark" => &mut self.commonmark,
                "pedantic" => &mut self.pedantic,
                "footnotes" => &mut self.footnotes,
                "yaml" => &mut self.yaml,
                "breaks" => &mut self.breaks,
                "position" => &mut self.position,
                _ => return Err(ConfigError::UnknownSetting(key.clone())),
            };

            match setting {
                Value::Null => {}
                Value::Bool(on) => *slot = *on,
                other => {
                    return Err(ConfigError::InvalidSetting {
                        key: key.clone(),
                        value: other.to_string(),
                    })
                }
            }
        }

        Ok(self)
    }

    /// Names of every recognized setting.
    pub fn keys() -> &'static [&'static str] {
        &KEYS
    }

    /// Characters that a backslash escapes in the active dialect.
    pub fn escapes(&self) -> &'static [char] {
        if self.commonmark {
            ESCAPES_COMMONMARK
        } else if self.gfm {
            ESCAPES_GFM
        } else {
            ESCAPES_DEFAULT
        }
    }
}
