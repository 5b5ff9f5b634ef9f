use std::sync::Arc;

use crate::{Command, EventHandler, EventPublisher, Result};

/// Handles commands.
pub trait CommandHandler {
    /// Tries to process `command`.
    ///
    /// If the command violates a business rule, return an
    /// [`Error::Validation`](crate::Error::Validation) and publish no events.
    fn handle_command(&mut self, command: &Command) -> Result<()>;
}

/// An aggregate receives requests for state changes as commands and emits
/// events through an [`EventPublisher`].
///
/// To reconstruct its state, an aggregate is handed every event previously
/// recorded for its [`id`](Aggregate::id) before it handles a command. A
/// fresh instance is built for every command.
pub trait Aggregate: CommandHandler + EventHandler {
    /// Uniquely identifies the aggregate.
    ///
    /// Used for routing commands to it and as the stream id of the events it
    /// emits.
    fn id(&self) -> &str;

    /// Configures the aggregate to emit events through `publisher`.
    fn publish_with(&mut self, publisher: Arc<dyn EventPublisher>);
}
