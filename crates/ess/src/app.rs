use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, info_span, Span};

use crate::{
    Clock, Command, Error, Event, EventHandler, EventStore, InMemoryEventStore, Result,
    SystemClock, ALL_STREAMS,
};

/// Processes commands and keeps projections up to date.
///
/// An application owns an [`EventStore`], a [`Clock`] and a set of named
/// projections. Commands are processed one at a time through
/// [`send`](Application::send).
pub struct Application {
    name: String,
    clock: Arc<dyn Clock>,
    store: Arc<dyn EventStore>,
    projections: BTreeMap<String, Box<dyn EventHandler>>,
    span: Span,
}

impl Application {
    /// Creates an application backed by an [`InMemoryEventStore`] and the
    /// [`SystemClock`].
    ///
    /// `name` becomes part of the span every log line is emitted in.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = info_span!("app", name = %name);

        Application {
            name,
            clock: Arc::new(SystemClock),
            store: Arc::new(InMemoryEventStore::new()),
            projections: BTreeMap::new(),
            span,
        }
    }

    /// Name of the application.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uses `store` to persist events and rebuild state.
    pub fn with_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.store = store;
        self
    }

    /// Uses `clock` to acknowledge commands and stamp events.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Registers `handler` as the projection `name`.
    ///
    /// Projections receive every event stored through this application and,
    /// on [`init`](Application::init), every event already in the store.
    /// Registering a name twice replaces the earlier projection.
    pub fn with_projection(
        mut self,
        name: impl Into<String>,
        handler: impl EventHandler + 'static,
    ) -> Self {
        self.projections.insert(name.into(), Box::new(handler));
        self
    }

    /// Emits log output inside `span` instead of the default `app` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The store events are persisted to.
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Rebuilds all projections by replaying the complete store through them.
    pub fn init(&mut self) -> Result<()> {
        let Self {
            store,
            projections,
            span,
            ..
        } = self;
        let _enter = span.enter();

        info!("INIT {} projections", projections.len());
        store
            .replay(ALL_STREAMS, &mut |event: &Event| {
                for (name, projection) in projections.iter_mut() {
                    debug!("PROJECT {} TO {name}", event.name);
                    projection.handle_event(event);
                }
            })
            .map_err(|err| {
                err.log();
                err
            })
    }

    /// Processes `command` and returns the id of the aggregate that handled
    /// it.
    ///
    /// The receiver is first handed the history of its stream. Events it
    /// publishes are stamped with the current time, stored and passed to
    /// every projection, in publishing order. Nothing is stored if any step
    /// before storing fails.
    ///
    /// A command that has already been executed is rejected with
    /// [`Error::AlreadyExecuted`] before it is acknowledged again.
    pub fn send(&mut self, command: &mut Command) -> Result<String> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.dispatch(command).map_err(|err| {
            err.log();
            err
        })
    }

    fn dispatch(&mut self, command: &mut Command) -> Result<String> {
        let Self {
            clock,
            store,
            projections,
            ..
        } = self;

        if command.is_executed() {
            return Err(Error::AlreadyExecuted(command.name().to_string()));
        }
        command.acknowledge(&**clock);

        let receiver = command.receiver()?;
        let id = receiver.id().to_string();
        store.replay(&id, &mut |event: &Event| receiver.handle_event(event))?;

        let transaction = Arc::new(InMemoryEventStore::new());
        receiver.publish_with(transaction.clone());

        info!("EXECUTE {command}");
        command.execute()?;

        let mut events = transaction.take_events()?;
        for event in events.iter_mut() {
            event.occur(&**clock);
            info!("EVENT {}", event.name);
        }

        store.store(&mut events)?;

        for event in &events {
            for (name, projection) in projections.iter_mut() {
                debug!("PROJECT {} TO {name}", event.name);
                projection.handle_event(event);
            }
        }

        Ok(id)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("projections", &self.projections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
