use std::{cell::RefCell, rc::Rc, sync::Arc};

use chrono::{TimeZone, Utc};
use ess::{Application, Event, EventStore, StaticClock, ALL_STREAMS};
use ess_filestore::FlatFileEventStore;
use ess_testing::{test_command, TestAggregate};

#[test]
fn send_persists_events_and_init_rebuilds_projections() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("events.json");
    let clock = StaticClock(Utc.with_ymd_and_hms(2016, 5, 1, 10, 0, 0).unwrap());
    let store = Arc::new(FlatFileEventStore::new(&path, clock));
    store.store(&mut [])?;

    let mut app = Application::new("test").with_clock(clock).with_store(store.clone());
    let mut command = test_command().new_command().with_receiver(Box::new(
        TestAggregate::new("a")
            .publishing(Event::new("test.run-1").for_stream("a").add("param", "value")),
    ));
    assert_eq!(app.send(&mut command)?, "a");

    let stored = store.load("a")?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].occurred_on, Some(clock.0));
    assert_eq!(stored[0].persisted_at, Some(clock.0));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut restarted = Application::new("test")
        .with_store(Arc::new(FlatFileEventStore::new(&path, clock)))
        .with_projection("names", move |event: &Event| {
            sink.borrow_mut().push(event.name.clone())
        });
    restarted.init()?;

    assert_eq!(*seen.borrow(), ["test.run-1"]);
    assert_eq!(restarted.store().load(ALL_STREAMS)?, stored);
    Ok(())
}

#[test]
fn send_requires_an_existing_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("events.json");
    let handled = Rc::new(RefCell::new(0));
    let counter = handled.clone();

    let mut app = Application::new("test").with_store(Arc::new(FlatFileEventStore::new(
        &path,
        StaticClock(Utc.with_ymd_and_hms(2016, 5, 1, 10, 0, 0).unwrap()),
    )));
    let mut command = test_command().new_command().with_receiver(Box::new(
        TestAggregate::new("a")
            .publishing(Event::new("test.run-1").for_stream("a"))
            .on_command(move || *counter.borrow_mut() += 1),
    ));

    let err = app.send(&mut command).unwrap_err();

    assert!(matches!(err, ess::Error::Store(_)));
    assert_eq!(*handled.borrow(), 0);
    assert!(!path.exists());
    Ok(())
}
