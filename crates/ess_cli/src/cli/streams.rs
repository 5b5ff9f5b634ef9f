use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use ess::{Event, EventStore, ALL_STREAMS};
use ess_filestore::FlatFileEventStore;

/// List every stream with its number of events
#[derive(Args, Clone, Debug)]
pub struct Streams {}

impl Streams {
    pub fn run(self, store: &FlatFileEventStore, out: &mut impl Write) -> Result<()> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        store
            .replay(ALL_STREAMS, &mut |event: &Event| {
                *counts.entry(event.stream_id.clone()).or_default() += 1;
            })
            .with_context(|| format!("could not read {}", store.path().display()))?;

        for (stream_id, count) in &counts {
            writeln!(out, "{count:>8}  {stream_id}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ess::SystemClock;

    use super::*;

    #[test]
    fn counts_events_per_stream() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FlatFileEventStore::new(dir.path().join("events.json"), SystemClock);
        store.store(&mut vec![
            Event::new("test.run").for_stream("b"),
            Event::new("test.run").for_stream("a"),
            Event::new("test.run").for_stream("b"),
        ])?;

        let mut out = Vec::new();
        Streams {}.run(&store, &mut out)?;

        assert_eq!(String::from_utf8(out)?, "       1  a\n       2  b\n");
        Ok(())
    }
}
