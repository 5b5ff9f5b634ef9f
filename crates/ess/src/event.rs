use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Aggregate, Clock, Result};

/// Event payload: field name to arbitrary JSON value.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A state change that has occurred.
///
/// Events are named in the past tense, e.g. `"user.signed-up"`. They are
/// built with [`Event::new`] and the chained setters, published by an
/// aggregate, and become durable once an [`EventStore`](crate::EventStore)
/// has stored them. Stored events are never mutated.
///
/// The serialized field names match the on-disk log format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// Unique identifier of this event. May be left empty.
    #[serde(default)]
    pub id: String,
    /// Id of the aggregate that emitted this event.
    #[serde(default)]
    pub stream_id: String,
    /// Name of the event type.
    pub name: String,
    /// Time at which the application has seen the event.
    #[serde(default)]
    pub occurred_on: Option<DateTime<Utc>>,
    /// Time at which the event has been written to persistent storage.
    #[serde(default)]
    pub persisted_at: Option<DateTime<Utc>>,
    /// Data recorded with the event in order to reconstruct state.
    #[serde(default)]
    pub payload: Payload,
}

impl Event {
    /// Creates a new, empty event of type `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Event {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Marks the event as being emitted by `source`.
    pub fn for_aggregate<A>(self, source: &A) -> Self
    where
        A: Aggregate + ?Sized,
    {
        self.for_stream(source.id())
    }

    /// Assigns the event to the stream `stream_id`.
    pub fn for_stream(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = stream_id.into();
        self
    }

    /// Sets the event's identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the payload field `name` to `value`, replacing any previous value.
    pub fn add(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Marks the occurrence time of the event according to `clock`.
    pub fn occur(&mut self, clock: &dyn Clock) -> &mut Self {
        self.occurred_on = Some(clock.now());
        self
    }

    /// Marks the time of persisting the event according to `clock`.
    pub fn persist(&mut self, clock: &dyn Clock) -> &mut Self {
        self.persisted_at = Some(clock.now());
        self
    }

    /// Whether the event belongs to the streams selected by `stream_id`.
    ///
    /// [`ALL_STREAMS`](crate::ALL_STREAMS) selects every stream, any other
    /// value only the stream with exactly that id.
    pub fn matches(&self, stream_id: &str) -> bool {
        stream_id == crate::ALL_STREAMS || stream_id == self.stream_id
    }
}

/// Processes events, either to rebuild an aggregate or to maintain a
/// projection.
pub trait EventHandler {
    /// Handle a single event.
    fn handle_event(&mut self, event: &Event);
}

impl<F> EventHandler for F
where
    F: FnMut(&Event),
{
    fn handle_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Target aggregates publish their events to.
pub trait EventPublisher {
    /// Queues `event` for publishing.
    fn publish_event(&self, event: Event) -> Result<()>;
}
