use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use ess::{Event, EventStore, ALL_STREAMS};
use ess_filestore::FlatFileEventStore;

/// List the events of one or all streams
#[derive(Args, Clone, Debug)]
pub struct Events {
    /// Only list events of this stream
    #[arg(long, default_value = ALL_STREAMS)]
    stream: String,
    /// Print one JSON object per line instead of a table
    #[arg(long)]
    json: bool,
}

impl Events {
    pub fn run(self, store: &FlatFileEventStore, out: &mut impl Write) -> Result<()> {
        let events = store
            .load(&self.stream)
            .with_context(|| format!("could not read {}", store.path().display()))?;

        if self.json {
            for event in &events {
                serde_json::to_writer(&mut *out, event)?;
                writeln!(out)?;
            }
            return Ok(());
        }

        table(&events).print(out)?;

        Ok(())
    }
}

fn table(events: &[Event]) -> prettytable::Table {
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

    for (position, event) in events.iter().enumerate() {
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

    table
}

#[cfg(test)]
mod tests {
    use ess::SystemClock;

    use super::*;

    #[test]
    fn prints_json_lines_of_the_selected_stream() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FlatFileEventStore::new(dir.path().join("events.json"), SystemClock);
        store.store(&mut vec![
            Event::new("test.run-1").for_stream("a"),
            Event::new("test.run-2").for_stream("b"),
        ])?;

        let mut out = Vec::new();
        Events {
            stream: "b".to_string(),
            json: true,
        }
        .run(&store, &mut out)?;

        let out = String::from_utf8(out)?;
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 1);
        let event: Event = serde_json::from_str(lines[0])?;
        assert_eq!(event.name, "test.run-2");
        Ok(())
    }

    #[test]
    fn prints_a_table_of_the_selected_stream() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FlatFileEventStore::new(dir.path().join("events.json"), SystemClock);
        store.store(&mut vec![
            Event::new("test.run-1").for_stream("a").add("param", "value"),
            Event::new("test.run-2").for_stream("b"),
        ])?;

        let mut out = Vec::new();
        Events {
            stream: "a".to_string(),
            json: false,
        }
        .run(&store, &mut out)?;

        let out = String::from_utf8(out)?;
        assert!(out.contains("Stream ID"));
        assert!(out.contains("test.run-1"));
        assert!(out.contains(r#"{"param":"value"}"#));
        assert!(!out.contains("test.run-2"));
        Ok(())
    }

    #[test]
    fn fails_without_a_log() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FlatFileEventStore::new(dir.path().join("events.json"), SystemClock);

        let err = Events {
            stream: ALL_STREAMS.to_string(),
            json: true,
        }
        .run(&store, &mut Vec::<u8>::new())
        .unwrap_err();

        assert!(err.to_string().starts_with("could not read"));
        Ok(())
    }
}
