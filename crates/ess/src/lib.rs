//! Event sourcing core.
//!
//! Any interaction with an [`Application`] happens by sending it
//! [`Command`]s. A command expresses user intent and is routed to an
//! [`Aggregate`], the object holding the business rules for one stream of
//! events.
//!
//! Handling a command either fails with an [`Error`] (usually a
//! [`ValidationError`]) or publishes [`Event`]s. Published events are
//! appended to an [`EventStore`] and then passed to every projection
//! registered with the application.
//!
//! Before a command is handled, the receiving aggregate is fed every event
//! previously recorded for its stream so it can rebuild whatever state it
//! needs. When the application starts, [`Application::init`] replays the
//! whole log through all projections, which restricts projections to
//! idempotent operations.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ess::{
//!     Aggregate, Application, Command, CommandDefinition, CommandHandler, Event, EventHandler,
//!     EventPublisher, Text, ValidationError,
//! };
//!
//! struct Counter {
//!     id: String,
//!     count: u64,
//!     events: Option<Arc<dyn EventPublisher>>,
//! }
//!
//! impl EventHandler for Counter {
//!     fn handle_event(&mut self, _event: &Event) {
//!         self.count += 1;
//!     }
//! }
//!
//! impl CommandHandler for Counter {
//!     fn handle_command(&mut self, command: &Command) -> ess::Result<()> {
//!         let by = command.get("by").map(|by| by.to_string()).unwrap_or_default();
//!         if by.is_empty() {
//!             return Err(ValidationError::new().with("by", "empty").into());
//!         }
//!
//!         if let Some(events) = &self.events {
//!             events.publish_event(Event::new("counter.incremented").for_aggregate(&*self).add("by", by))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Aggregate for Counter {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     fn publish_with(&mut self, publisher: Arc<dyn EventPublisher>) {
//!         self.events = Some(publisher);
//!     }
//! }
//!
//! let increment = CommandDefinition::new("increment")
//!     .field("by", Text::trimmed())
//!     .target(|command: &Command| {
//!         Box::new(Counter {
//!             id: command.aggregate_id(),
//!             count: 0,
//!             events: None,
//!         })
//!     });
//!
//! let mut app = Application::new("counter");
//! let mut command = increment.new_command();
//! command.set("id", "clicks").set("by", " 2 ");
//!
//! let id = app.send(&mut command)?;
//! assert_eq!(id, "clicks");
//! assert_eq!(app.store().load("clicks")?.len(), 1);
//! # Ok::<(), ess::Error>(())
//! ```

#![deny(missing_docs)]

pub use aggregate::{Aggregate, CommandHandler};
pub use app::Application;
pub use clock::{Clock, StaticClock, SystemClock};
pub use command::{Command, CommandDefinition, Target};
pub use error::{Error, Result};
pub use event::{Event, EventHandler, EventPublisher, Payload};
pub use event_store::{EventStore, ALL_STREAMS};
pub use form::Form;
pub use inmemory::InMemoryEventStore;
pub use validation::ValidationError;
pub use value::{Identifier, Text, Timestamp, Value, ValueError};

mod aggregate;
mod app;
mod clock;
mod command;
mod error;
mod event;
mod event_store;
mod form;
mod inmemory;
mod validation;
mod value;

#[cfg(any(test, feature = "tests-cfg"))]
#[doc(hidden)]
pub mod tests_cfg;
