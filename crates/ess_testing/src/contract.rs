//! Scenarios every [`EventStore`] implementation must pass.
//!
//! Each scenario builds a fresh store with `make_store`, appends a few
//! events and checks what replay hands back. Stores may stamp events when
//! storing them, so only ids, names, stream ids and payloads are compared.

use std::fmt;

use ess::{Event, EventStore, ALL_STREAMS};
use serde_json::json;

#[derive(Debug)]
pub struct ContractTestFailure {
    scenario: &'static str,
    detail: String,
}

impl ContractTestFailure {
    fn new(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scenario,
            detail: detail.into(),
        }
    }

    fn store_error(scenario: &'static str, operation: &'static str, error: ess::Error) -> Self {
        Self::new(
            scenario,
            format!("{operation} operation returned unexpected error: {error}"),
        )
    }

    fn assertion(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self::new(scenario, detail)
    }
}

impl fmt::Display for ContractTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.detail)
    }
}

impl std::error::Error for ContractTestFailure {}

pub type ContractTestResult = Result<(), ContractTestFailure>;

/// The parts of an event a store must hand back unchanged.
#[derive(Debug, PartialEq)]
struct Recorded {
    id: String,
    stream_id: String,
    name: String,
    payload: ess::Payload,
}

impl From<&Event> for Recorded {
    fn from(event: &Event) -> Self {
        Recorded {
            id: event.id.clone(),
            stream_id: event.stream_id.clone(),
            name: event.name.clone(),
            payload: event.payload.clone(),
        }
    }
}

fn contract_event(stream_id: &str, name: &str) -> Event {
    Event::new(name).for_stream(stream_id).add("stream", stream_id)
}

fn store_events<S: EventStore>(
    scenario: &'static str,
    store: &S,
    mut events: Vec<Event>,
) -> ContractTestResult {
    store
        .store(&mut events)
        .map_err(|error| ContractTestFailure::store_error(scenario, "store", error))
}

fn load_events<S: EventStore>(
    scenario: &'static str,
    store: &S,
    stream_id: &str,
) -> Result<Vec<Recorded>, ContractTestFailure> {
    let events = store
        .load(stream_id)
        .map_err(|error| ContractTestFailure::store_error(scenario, "replay", error))?;
    Ok(events.iter().map(Recorded::from).collect())
}

fn expect_names(
    scenario: &'static str,
    stream_id: &str,
    loaded: &[Recorded],
    expected: &[&str],
) -> ContractTestResult {
    let names: Vec<&str> = loaded.iter().map(|event| event.name.as_str()).collect();
    if names != expected {
        return Err(ContractTestFailure::assertion(
            scenario,
            format!("expected replay of `{stream_id}` to yield {expected:?}, observed {names:?}"),
        ));
    }

    Ok(())
}

/// Replaying a stream yields exactly that stream's events, in append order.
pub fn test_stream_isolation<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "stream_isolation";

    let store = make_store();
    store_events(
        SCENARIO,
        &store,
        vec![
            contract_event("a", "first"),
            contract_event("b", "second"),
            contract_event("a", "third"),
        ],
    )?;

    let a = load_events(SCENARIO, &store, "a")?;
    expect_names(SCENARIO, "a", &a, &["first", "third"])?;
    if a.iter().any(|event| event.stream_id != "a") {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "replay of `a` yielded events of another stream",
        ));
    }

    let b = load_events(SCENARIO, &store, "b")?;
    expect_names(SCENARIO, "b", &b, &["second"])
}

/// Replaying [`ALL_STREAMS`] yields every event, in append order.
pub fn test_all_streams<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "all_streams";

    let store = make_store();
    store_events(
        SCENARIO,
        &store,
        vec![
            contract_event("a", "first"),
            contract_event("b", "second"),
            contract_event("c", "third"),
        ],
    )?;

    let all = load_events(SCENARIO, &store, ALL_STREAMS)?;
    expect_names(SCENARIO, ALL_STREAMS, &all, &["first", "second", "third"])
}

/// Stream ids match exactly: unknown ids and prefixes select nothing.
pub fn test_unknown_streams<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "unknown_streams";

    let store = make_store();
    store_events(SCENARIO, &store, vec![contract_event("account-1", "opened")])?;

    for stream_id in ["missing", "account", "account-", "account-12", ""] {
        let loaded = load_events(SCENARIO, &store, stream_id)?;
        expect_names(SCENARIO, stream_id, &loaded, &[])?;
    }

    Ok(())
}

/// Events stored by later calls replay after those stored by earlier ones.
pub fn test_append_order_across_batches<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "append_order_across_batches";

    let store = make_store();
    store_events(
        SCENARIO,
        &store,
        vec![contract_event("a", "1"), contract_event("a", "2")],
    )?;
    store_events(SCENARIO, &store, vec![contract_event("b", "3")])?;
    store_events(SCENARIO, &store, vec![contract_event("a", "4")])?;

    let a = load_events(SCENARIO, &store, "a")?;
    expect_names(SCENARIO, "a", &a, &["1", "2", "4"])?;

    let all = load_events(SCENARIO, &store, ALL_STREAMS)?;
    expect_names(SCENARIO, ALL_STREAMS, &all, &["1", "2", "3", "4"])
}

/// Storing no events succeeds and changes nothing.
pub fn test_empty_batch<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "empty_batch";

    let store = make_store();
    store_events(SCENARIO, &store, Vec::new())?;

    let all = load_events(SCENARIO, &store, ALL_STREAMS)?;
    expect_names(SCENARIO, ALL_STREAMS, &all, &[])?;

    store_events(SCENARIO, &store, vec![contract_event("a", "only")])?;
    store_events(SCENARIO, &store, Vec::new())?;

    let all = load_events(SCENARIO, &store, ALL_STREAMS)?;
    expect_names(SCENARIO, ALL_STREAMS, &all, &["only"])
}

/// Ids, names, stream ids and payloads replay exactly as stored.
pub fn test_payload_round_trip<F, S>(make_store: F) -> ContractTestResult
where
    F: FnOnce() -> S,
    S: EventStore,
{
    const SCENARIO: &str = "payload_round_trip";

    let event = Event::new("user.signed-up")
        .for_stream("jane")
        .with_id("evt-1")
        .add("name", "Jane Doe")
        .add("age", 42)
        .add("admin", false)
        .add("tags", json!(["a", "b"]))
        .add("address", json!({ "city": "Berlin", "zip": null }));
    let expected = Recorded::from(&event);

    let store = make_store();
    store_events(SCENARIO, &store, vec![event])?;

    let loaded = load_events(SCENARIO, &store, "jane")?;
    match loaded.as_slice() {
        [recorded] if *recorded == expected => Ok(()),
        _ => Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected {expected:?}, observed {loaded:?}"),
        )),
    }
}

#[macro_export]
macro_rules! event_store_contract_tests {
    (suite = $suite:ident, make_store = $make_store:expr $(,)?) => {
        #[allow(non_snake_case)]
        mod $suite {
            use super::*;
            use $crate::contract::{
                test_all_streams, test_append_order_across_batches, test_empty_batch,
                test_payload_round_trip, test_stream_isolation, test_unknown_streams,
            };

            #[test]
            fn stream_isolation_contract() {
                test_stream_isolation($make_store).expect("event store contract failed");
            }

            #[test]
            fn all_streams_contract() {
                test_all_streams($make_store).expect("event store contract failed");
            }

            #[test]
            fn unknown_streams_contract() {
                test_unknown_streams($make_store).expect("event store contract failed");
            }

            #[test]
            fn append_order_across_batches_contract() {
                test_append_order_across_batches($make_store)
                    .expect("event store contract failed");
            }

            #[test]
            fn empty_batch_contract() {
                test_empty_batch($make_store).expect("event store contract failed");
            }

            #[test]
            fn payload_round_trip_contract() {
                test_payload_round_trip($make_store).expect("event store contract failed");
            }
        }
    };
}

pub use event_store_contract_tests;
