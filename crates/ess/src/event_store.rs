//! Event store

use crate::{Event, EventHandler, Result};

/// Stream id selecting every event, regardless of its stream.
pub const ALL_STREAMS: &str = "*";

/// Persists events and restores application state from the log of persisted
/// events.
///
/// A store is append-only and totally ordered by append order.
pub trait EventStore {
    /// Appends `events`, in the given order, so that they are visible to every
    /// subsequent [`replay`](EventStore::replay).
    ///
    /// Implementations may stamp the events, e.g. with their persisting time,
    /// which is why they are passed mutably.
    fn store(&self, events: &mut [Event]) -> Result<()>;

    /// Passes every stored event of the stream `stream_id` to `handler`, in
    /// append order.
    ///
    /// Use [`ALL_STREAMS`] to select all events. Any other value matches
    /// stream ids exactly.
    fn replay(&self, stream_id: &str, handler: &mut dyn EventHandler) -> Result<()>;

    /// Collects the events of the stream `stream_id`, in append order.
    fn load(&self, stream_id: &str) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        self.replay(stream_id, &mut |event: &Event| events.push(event.clone()))?;
        Ok(events)
    }
}

