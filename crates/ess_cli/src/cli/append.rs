use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use ess::{Event, EventStore, Payload, SystemClock};
use ess_filestore::FlatFileEventStore;
use tracing::info;

/// Append a single event to the log
#[derive(Args, Clone, Debug)]
pub struct Append {
    /// Stream the event belongs to
    stream: String,
    /// Name of the event
    name: String,
    /// Event payload as a JSON object
    payload: Option<String>,
}

impl Append {
    pub fn run(self, store: &FlatFileEventStore, out: &mut impl Write) -> Result<()> {
        let payload: Payload = match &self.payload {
            Some(payload) => {
                serde_json::from_str(payload).context("payload must be a JSON object")?
            }
            None => Payload::new(),
        };

        let mut event = Event::new(&self.name).for_stream(&self.stream);
        event.payload = payload;
        event.occur(&SystemClock);

        store
            .store(std::slice::from_mut(&mut event))
            .with_context(|| format!("could not append to {}", store.path().display()))?;
        info!("EVENT {}", event.name);

        writeln!(out, "appended {} to {}", self.name, self.stream)?;
        Ok(())
    }
}
