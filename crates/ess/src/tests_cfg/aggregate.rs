use std::fmt;
use std::sync::Arc;

use crate::{Aggregate, Command, CommandHandler, Error, Event, EventHandler, EventPublisher, Result};

/// Scriptable aggregate.
///
/// Publishes a fixed list of events when handling a command, or fails with a
/// preset error instead. Hooks observe replayed events and handled commands.
#[derive(Default)]
pub struct TestAggregate {
    id: String,
    events: Option<Arc<dyn EventPublisher>>,
    publishes: Vec<Event>,
    failure: Option<Error>,
    on_event: Option<Box<dyn FnMut(&Event)>>,
    on_command: Option<Box<dyn FnMut()>>,
}

impl TestAggregate {
    /// An aggregate that handles commands without publishing anything.
    pub fn new(id: impl Into<String>) -> Self {
        TestAggregate {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Builds the receiver of `command`, named after its aggregate id.
    pub fn from_command(command: &Command) -> Box<dyn Aggregate> {
        Box::new(TestAggregate::new(command.aggregate_id()))
    }

    /// Fail the next command with `err`.
    pub fn fail_with(mut self, err: impl Into<Error>) -> Self {
        self.failure = Some(err.into());
        self
    }

    /// Publish `event` when handling a command.
    pub fn publishing(mut self, event: Event) -> Self {
        self.publishes.push(event);
        self
    }

    /// Call `hook` for every event handed to the aggregate.
    pub fn on_event(mut self, hook: impl FnMut(&Event) + 'static) -> Self {
        self.on_event = Some(Box::new(hook));
        self
    }

    /// Call `hook` whenever a command is handled.
    pub fn on_command(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_command = Some(Box::new(hook));
        self
    }
}

impl EventHandler for TestAggregate {
    fn handle_event(&mut self, event: &Event) {
        if let Some(hook) = &mut self.on_event {
            hook(event);
        }
    }
}

impl CommandHandler for TestAggregate {
    fn handle_command(&mut self, _command: &Command) -> Result<()> {
        if let Some(hook) = &mut self.on_command {
            hook();
        }

        if let Some(err) = self.failure.take() {
            return Err(err);
        }

        if let Some(events) = &self.events {
            for event in &self.publishes {
                events.publish_event(event.clone())?;
            }
        }

        Ok(())
    }
}

impl Aggregate for TestAggregate {
    fn id(&self) -> &str {
        &self.id
    }

    fn publish_with(&mut self, publisher: Arc<dyn EventPublisher>) {
        self.events = Some(publisher);
    }
}

impl fmt::Debug for TestAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestAggregate")
            .field("id", &self.id)
            .field("publishes", &self.publishes)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
