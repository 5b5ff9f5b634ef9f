use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read access to submitted form values, used to fill in command parameters.
pub trait Form {
    /// Returns the text submitted for `field`, or `""` if there is none.
    fn value_of(&self, field: &str) -> &str;
}

impl<S> Form for HashMap<String, String, S>
where
    S: BuildHasher,
{
    fn value_of(&self, field: &str) -> &str {
        self.get(field).map(String::as_str).unwrap_or_default()
    }
}

impl Form for BTreeMap<String, String> {
    fn value_of(&self, field: &str) -> &str {
        self.get(field).map(String::as_str).unwrap_or_default()
    }
}
