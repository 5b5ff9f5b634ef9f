//! Command parameter values.
//!
//! A [`Value`] captures, sanitizes and validates one parameter of a
//! [`Command`](crate::Command).

use std::any::Any;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Converts text into a typed parameter.
pub trait Value: fmt::Display + fmt::Debug {
    /// Replaces the content of this value by parsing `text`.
    fn parse(&mut self, text: &str) -> Result<(), ValueError>;

    /// Creates a new instance with the same internal state.
    fn duplicate(&self) -> Box<dyn Value>;

    /// Allows downcasting to the concrete value type.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Value> {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

/// Reasons text is rejected by a [`Value`].
///
/// The display text of each variant is the message recorded in a
/// [`ValidationError`](crate::ValidationError).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Input is empty where content is required.
    #[error("empty")]
    Empty,
    /// Input is not a valid identifier.
    #[error("malformed_identifier")]
    MalformedIdentifier,
    /// Input is not an RFC 3339 timestamp.
    #[error("malformed_timestamp")]
    MalformedTimestamp,
    /// The command has no such field.
    #[error("unknown_field")]
    UnknownField,
}

/// A string parameter, passed through a sanitizer when parsed.
#[derive(Clone, Debug)]
pub struct Text {
    original: String,
    sanitized: String,
    sanitizer: fn(&str) -> String,
}

impl Text {
    /// A string which strips leading and trailing whitespace.
    pub fn trimmed() -> Self {
        Text {
            original: String::new(),
            sanitized: String::new(),
            sanitizer: |s| s.trim().to_string(),
        }
    }

    /// A string holding `value` verbatim.
    pub fn verbatim(value: impl Into<String>) -> Self {
        let value = value.into();
        Text {
            original: value.clone(),
            sanitized: value,
            sanitizer: str::to_string,
        }
    }

    /// The sanitized content.
    pub fn as_str(&self) -> &str {
        &self.sanitized
    }

    /// The content as it was before sanitizing.
    pub fn original(&self) -> &str {
        &self.original
    }
}

impl Value for Text {
    fn parse(&mut self, text: &str) -> Result<(), ValueError> {
        self.original = text.to_string();
        self.sanitized = (self.sanitizer)(text);
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sanitized)
    }
}

/// A parameter serving as an identifier.
///
/// Accepts dashes, lowercase ASCII letters and digits after trimming
/// surrounding whitespace. The empty string is not a valid identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    id: String,
}

impl Identifier {
    /// A new, empty identifier.
    pub fn new() -> Self {
        Identifier::default()
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    fn is_valid(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c == '-' || c.is_ascii_lowercase() || c.is_ascii_digit())
    }
}

impl Value for Identifier {
    fn parse(&mut self, text: &str) -> Result<(), ValueError> {
        let id = text.trim();
        if !Self::is_valid(id) {
            return Err(ValueError::MalformedIdentifier);
        }

        self.id = id.to_string();
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A point in time, rendered and parsed as RFC 3339.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The wrapped time.
    pub fn time(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Value for Timestamp {
    fn parse(&mut self, text: &str) -> Result<(), ValueError> {
        let time = DateTime::parse_from_rfc3339(text.trim())
            .map_err(|_| ValueError::MalformedTimestamp)?;
        self.0 = time.with_timezone(&Utc);
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Value> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}
