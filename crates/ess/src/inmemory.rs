use std::sync::RwLock;

use tracing::trace;

use crate::{Error, Event, EventHandler, EventPublisher, EventStore, Result};

/// An in memory event store.
///
/// Events live in a `Vec<Event>` and are lost when the process exits, which
/// makes this store useful for testing and as the default store of an
/// [`Application`](crate::Application).
///
/// It also implements [`EventPublisher`], so an instance can capture the
/// events published while a single command is handled before they are handed
/// to the durable store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<Event>>,
}

impl InMemoryEventStore {
    /// Creates a store holding no events.
    pub fn new() -> Self {
        InMemoryEventStore::default()
    }

    /// Returns a copy of every stored event, in append order.
    pub fn events(&self) -> Result<Vec<Event>> {
        let events_lock = self.events.read().map_err(|_| Error::RwPoison)?;
        Ok(events_lock.clone())
    }

    /// Removes and returns every stored event, in append order.
    pub fn take_events(&self) -> Result<Vec<Event>> {
        let mut events_lock = self.events.write().map_err(|_| Error::RwPoison)?;
        Ok(std::mem::take(&mut *events_lock))
    }

    /// Number of stored events.
    pub fn len(&self) -> Result<usize> {
        let events_lock = self.events.read().map_err(|_| Error::RwPoison)?;
        Ok(events_lock.len())
    }

    /// Whether no events are stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl EventStore for InMemoryEventStore {
    fn store(&self, events: &mut [Event]) -> Result<()> {
        let mut events_lock = self.events.write().map_err(|_| Error::RwPoison)?;
        events_lock.extend(events.iter().cloned());
        trace!(count = events.len(), total = events_lock.len(), "stored events");

        Ok(())
    }

    fn replay(&self, stream_id: &str, handler: &mut dyn EventHandler) -> Result<()> {
        // Handlers run after the lock is released, so they may use this store.
        let matching: Vec<Event> = {
            let events_lock = self.events.read().map_err(|_| Error::RwPoison)?;
            events_lock
                .iter()
                .filter(|event| event.matches(stream_id))
                .cloned()
                .collect()
        };

        trace!(stream_id, count = matching.len(), "replaying events");
        for event in &matching {
            handler.handle_event(event);
        }

        Ok(())
    }
}

impl EventPublisher for InMemoryEventStore {
    fn publish_event(&self, event: Event) -> Result<()> {
        let mut events_lock = self.events.write().map_err(|_| Error::RwPoison)?;
        events_lock.push(event);

        Ok(())
    }
}

#[cfg(feature = "debug")]
impl InMemoryEventStore {
    /// Print the event store as a table to stdout.
    pub fn print(&self) -> Result<()> {
        let events_lock = self.events.read().map_err(|_| Error::RwPoison)?;

        let mut table = prettytable::Table::new();
        table.set_titles(
            [
                "#",
                "ID",
                "Stream ID",
                "Name",
                "Occurred On",
                "Persisted At",
                "Payload",
            ]
            .into(),
        );

        if events_lock.is_empty() {
            table.add_row(["", "", "", "", "", "", ""].into());
        } else {
            for (position, event) in events_lock.iter().enumerate() {
                table.add_row(
                    [
                        position.to_string(),
                        event.id.clone(),
                        event.stream_id.clone(),
                        event.name.clone(),
                        event
                            .occurred_on
                            .map(|time| time.to_rfc3339())
                            .unwrap_or_default(),
                        event
                            .persisted_at
                            .map(|time| time.to_rfc3339())
                            .unwrap_or_default(),
                        serde_json::Value::Object(event.payload.clone()).to_string(),
                    ]
                    .into(),
                );
            }
        }

        table.printstd();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<Event> {
        vec![
            Event::new("test.run-1").for_stream("id").add("param", "value"),
            Event::new("test.run-1").for_stream("other").add("param", "other"),
            Event::new("test.run-2").for_stream("id").add("param", "new-value"),
        ]
    }

    #[test]
    fn replays_only_matching_stream_in_order() {
        let store = InMemoryEventStore::new();
        store.store(&mut history()).unwrap();

        let names: Vec<_> = store
            .load("id")
            .unwrap()
            .into_iter()
            .map(|event| event.payload["param"].clone())
            .collect();
        assert_eq!(names, ["value", "new-value"]);
    }

    #[test]
    fn replays_everything_for_all_streams() {
        let store = InMemoryEventStore::new();
        store.store(&mut history()).unwrap();

        assert_eq!(store.load("*").unwrap(), history());
    }

    #[test]
    fn publishing_appends_events() {
        let store = InMemoryEventStore::new();
        store.publish_event(Event::new("a")).unwrap();
        store.publish_event(Event::new("b")).unwrap();

        let names: Vec<_> = store.events().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn take_events_drains_the_store() {
        let store = InMemoryEventStore::new();
        store.publish_event(Event::new("a")).unwrap();

        assert_eq!(store.take_events().unwrap().len(), 1);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn handlers_may_store_into_the_replayed_store() {
        let store = InMemoryEventStore::new();
        store.store(&mut history()).unwrap();

        store
            .replay("other", &mut |event: &Event| {
                let mut copy = vec![event.clone().for_stream("copy")];
                store.store(&mut copy).unwrap();
            })
            .unwrap();

        assert_eq!(store.load("copy").unwrap().len(), 1);
        assert_eq!(store.len().unwrap(), 4);
    }
}
