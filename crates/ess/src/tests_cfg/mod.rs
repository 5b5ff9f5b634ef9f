//! Test doubles shared by the unit tests of this crate and by store crates.

pub use aggregate::TestAggregate;

mod aggregate;

use crate::{CommandDefinition, Text};

/// The `"test"` command: a trimmed `"param"` field, delivered to a
/// [`TestAggregate`] named after the command's id.
pub fn test_command() -> CommandDefinition {
    CommandDefinition::new("test")
        .field("param", Text::trimmed())
        .target(TestAggregate::from_command)
}
