use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Captures errors about the values of a command's parameters or the state of
/// a whole aggregate.
///
/// Return errors of this type from command handlers in your aggregates.
///
/// Messages are kept per field, in the order they were recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "error")]
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Field under which errors that do not belong to a single field are
    /// recorded.
    pub const ALL_FIELDS: &'static str = "$all";

    /// Returns a new, empty validation error.
    pub fn new() -> Self {
        ValidationError::default()
    }

    /// Returns true if no errors have been recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `desc` as an error for `field`.
    pub fn add(&mut self, field: impl Into<String>, desc: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(desc.into());
        self
    }

    /// Owned variant of [`add`](ValidationError::add) for building errors in
    /// one expression.
    pub fn with(mut self, field: impl Into<String>, desc: impl Into<String>) -> Self {
        self.add(field, desc);
        self
    }

    /// Records errors from `err` into this instance.
    ///
    /// If `err` is a [`ValidationError`] (bare or wrapped in
    /// [`Error::Validation`]), the messages of every field are appended to
    /// the messages already recorded here. Any other error is recorded by its
    /// display text under [`ALL_FIELDS`](ValidationError::ALL_FIELDS).
    pub fn merge(&mut self, err: &(dyn std::error::Error + 'static)) -> &mut Self {
        let other = err.downcast_ref::<ValidationError>().or_else(|| {
            err.downcast_ref::<Error>()
                .and_then(|err| err.as_validation())
        });

        match other {
            Some(other) => {
                for (field, errors) in &other.errors {
                    self.errors
                        .entry(field.clone())
                        .or_default()
                        .extend(errors.iter().cloned());
                }
                self
            }
            None => self.add(Self::ALL_FIELDS, err.to_string()),
        }
    }

    /// Returns `Ok(())` if nothing has been recorded, otherwise this error.
    ///
    /// # Example
    ///
    /// ```
    /// use ess::ValidationError;
    ///
    /// fn check(param: &str) -> Result<(), ValidationError> {
    ///     let mut err = ValidationError::new();
    ///     if param.is_empty() {
    ///         err.add("param", "empty");
    ///     }
    ///     err.into_result()
    /// }
    ///
    /// assert!(check("value").is_ok());
    /// assert!(check("").is_err());
    /// ```
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// All recorded messages, keyed by field.
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, errors) in &self.errors {
            write!(f, "{field}: {}; ", errors.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn is_ok_without_errors() {
        assert!(ValidationError::new().is_ok());
    }

    #[test]
    fn is_not_ok_with_errors() {
        let err = ValidationError::new().with("test", "error");

        assert!(!err.is_ok());
    }

    #[test]
    fn add_keeps_messages_in_order() {
        let mut err = ValidationError::new();
        err.add("field", "first").add("field", "second");

        assert_eq!(
            err.get("field"),
            Some(&["first".to_string(), "second".to_string()][..])
        );
    }

    #[test]
    fn merge_records_other_error_types_under_all_fields() {
        let test_error = io::Error::new(io::ErrorKind::Other, "test error");
        let mut err = ValidationError::new();
        err.merge(&test_error);

        let all = err.get(ValidationError::ALL_FIELDS).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], test_error.to_string());
    }

    #[test]
    fn merge_unions_validation_errors() {
        let mut err = ValidationError::new().with("a", "one");
        let other = ValidationError::new().with("a", "two").with("b", "three");
        err.merge(&other);

        assert_eq!(
            err.get("a"),
            Some(&["one".to_string(), "two".to_string()][..])
        );
        assert_eq!(err.get("b"), Some(&["three".to_string()][..]));
        assert!(err.get(ValidationError::ALL_FIELDS).is_none());
    }

    #[test]
    fn merge_unwraps_wrapped_validation_errors() {
        let wrapped = Error::from(ValidationError::new().with("param", "invalid"));
        let mut err = ValidationError::new();
        err.merge(&wrapped);

        assert_eq!(err, ValidationError::new().with("param", "invalid"));
    }

    #[test]
    fn into_result_is_ok_without_errors() {
        assert_eq!(ValidationError::new().into_result(), Ok(()));
    }

    #[test]
    fn into_result_returns_self_with_errors() {
        let err = ValidationError::new().with("field", "error");

        assert_eq!(err.clone().into_result(), Err(err));
    }

    #[test]
    fn display_lists_every_field() {
        let err = ValidationError::new()
            .with("email", "empty")
            .with("password", "empty")
            .with("password", "too_short");

        assert_eq!(err.to_string(), "email: empty; password: empty, too_short; ");
    }

    #[test]
    fn serializes_under_error_key() {
        let err = ValidationError::new().with("param", "invalid");

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "error": { "param": ["invalid"] } })
        );
    }
}
