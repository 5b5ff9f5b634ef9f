use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufWriter, Write},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use ess::{Clock, Event, EventHandler, EventStore};
use tracing::{debug, trace};

use crate::Error;

/// Event store appending newline delimited JSON to a single file.
///
/// The file is opened anew for every call and closed before returning, on
/// success and on error alike. Writes are not locked against other
/// processes.
///
/// Only [`store`](EventStore::store) creates the file. Replaying a log that
/// does not exist yet is an error, so create it (storing an empty batch is
/// enough) before the first [`Application::send`](ess::Application::send),
/// which replays the receiver's stream.
///
/// A batch that fails halfway leaves the events written so far in the file.
/// A truncated record makes every later replay fail with
/// [`Error::DeserializeEvent`] until the file is repaired by hand.
#[derive(Clone)]
pub struct FlatFileEventStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FlatFileEventStore {
    /// Creates a store writing to `path` and stamping persisted events with
    /// the time of `clock`. Nothing is touched on disk until the first
    /// [`store`](EventStore::store).
    ///
    /// `path` is cleaned lexically: `.` segments are dropped and `..` removes
    /// the preceding segment, without consulting the file system.
    pub fn new(path: impl AsRef<Path>, clock: impl Clock + 'static) -> Self {
        FlatFileEventStore {
            path: clean(path.as_ref()),
            clock: Arc::new(clock),
        }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&self) -> Result<File, Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        Ok(options.open(&self.path)?)
    }

    fn append(&self, events: &mut [Event]) -> Result<(), Error> {
        let mut writer = BufWriter::new(self.open_for_append()?);
        for event in events.iter_mut() {
            event.persist(&*self.clock);
            serde_json::to_writer(&mut writer, &*event).map_err(Error::SerializeEvent)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), count = events.len(), "stored events");
        Ok(())
    }

    fn read(&self, stream_id: &str, handler: &mut dyn EventHandler) -> Result<(), Error> {
        let reader = io::BufReader::new(File::open(&self.path)?);

        let mut replayed = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event: Event = serde_json::from_str(&line).map_err(|source| {
                Error::DeserializeEvent {
                    line: index + 1,
                    source,
                }
            })?;
            if event.matches(stream_id) {
                handler.handle_event(&event);
                replayed += 1;
            }
        }

        trace!(path = %self.path.display(), stream_id, replayed, "replayed events");
        Ok(())
    }
}

/// Shortest path equivalent to `path` by purely lexical processing.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.last() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) => {}
                _ => cleaned.push(component),
            },
            _ => cleaned.push(component),
        }
    }

    if cleaned.is_empty() {
        return PathBuf::from(".");
    }
    cleaned.iter().collect()
}

impl EventStore for FlatFileEventStore {
    fn store(&self, events: &mut [Event]) -> ess::Result<()> {
        Ok(self.append(events)?)
    }

    fn replay(&self, stream_id: &str, handler: &mut dyn EventHandler) -> ess::Result<()> {
        Ok(self.read(stream_id, handler)?)
    }
}

impl fmt::Debug for FlatFileEventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatFileEventStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use ess::{StaticClock, ALL_STREAMS};
    use tempfile::NamedTempFile;

    use super::*;

    fn clock() -> StaticClock {
        StaticClock(Utc.with_ymd_and_hms(2016, 5, 1, 10, 0, 0).unwrap())
    }

    fn history() -> Vec<Event> {
        vec![
            Event::new("test.run-1").for_stream("id").add("param", "value"),
            Event::new("test.run-1").for_stream("other").add("param", "other"),
            Event::new("test.run-2").for_stream("id").add("param", "new-value"),
        ]
    }

    #[test]
    fn it_works() -> Result<(), Box<dyn std::error::Error>> {
        let file_store = NamedTempFile::new()?.into_temp_path().to_path_buf();

        let event_store = FlatFileEventStore::new(&file_store, clock());
        event_store.store(&mut history())?;

        let file_content = fs::read_to_string(&file_store)?;
        assert_eq!(file_content.lines().count(), 3);
        assert!(file_content.ends_with('\n'));

        let reopened = FlatFileEventStore::new(&file_store, clock());
        let events = reopened.load("id")?;
        let payloads: Vec<_> = events.iter().map(|e| e.payload["param"].clone()).collect();
        assert_eq!(payloads, ["value", "new-value"]);
        assert!(events.iter().all(|e| e.persisted_at == Some(clock().0)));
        assert_eq!(reopened.load(ALL_STREAMS)?.len(), 3);

        fs::remove_file(file_store)?;
        Ok(())
    }

    #[test]
    fn store_stamps_persisted_at() -> Result<(), Box<dyn std::error::Error>> {
        let file_store = NamedTempFile::new()?.into_temp_path().to_path_buf();
        let event_store = FlatFileEventStore::new(&file_store, clock());

        let mut events = history();
        event_store.store(&mut events)?;

        assert!(events.iter().all(|e| e.persisted_at == Some(clock().0)));
        fs::remove_file(file_store)?;
        Ok(())
    }

    #[test]
    fn store_creates_parent_directories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("./log").join("events.json");
        let event_store = FlatFileEventStore::new(&path, clock());

        event_store.store(&mut history())?;

        assert!(dir.path().join("nested/log/events.json").is_file());
        assert!(!event_store.path().to_string_lossy().contains("/./"));
        Ok(())
    }

    #[test]
    fn paths_are_cleaned_lexically() {
        let cases = [
            ("logs/./events.json", "logs/events.json"),
            ("logs/old/../events.json", "logs/events.json"),
            ("./events.json", "events.json"),
            ("../logs/events.json", "../logs/events.json"),
            ("a/../../events.json", "../events.json"),
            ("/../events.json", "/events.json"),
            ("logs/..", "."),
        ];

        for (path, expected) in cases {
            let event_store = FlatFileEventStore::new(path, clock());
            assert_eq!(event_store.path(), Path::new(expected), "{path}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn store_creates_private_files() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.json");
        FlatFileEventStore::new(&path, clock()).store(&mut history())?;

        let mode = fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o077, 0);
        Ok(())
    }

    #[test]
    fn replay_of_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let event_store = FlatFileEventStore::new(dir.path().join("events.json"), clock());

        let err = event_store.load(ALL_STREAMS).unwrap_err();

        assert!(matches!(err, ess::Error::Store(_)));
        Ok(())
    }

    #[test]
    fn replay_reports_the_line_of_a_truncated_record() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.json");
        let event_store = FlatFileEventStore::new(&path, clock());
        event_store.store(&mut history())?;

        let mut content = fs::read_to_string(&path)?;
        content.push_str(r#"{"Id":"","StreamId":"id","Na"#);
        fs::write(&path, content)?;

        let source = match event_store.load("id").unwrap_err() {
            ess::Error::Store(source) => source,
            err => panic!("expected store error, got {err:?}"),
        };
        assert!(matches!(
            source.downcast_ref::<Error>(),
            Some(Error::DeserializeEvent { line: 4, .. })
        ));
        Ok(())
    }

    #[test]
    fn replay_reads_logs_written_elsewhere() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.json");
        fs::write(
            &path,
            concat!(
                r#"{"Id":"","StreamId":"id","Name":"test.run","OccurredOn":"2016-05-01T10:00:00Z","PersistedAt":"2016-05-01T10:00:01Z","Payload":{"param":"value"}}"#,
                "\n\n",
                r#"{"Id":"","StreamId":"other","Name":"test.run","OccurredOn":"2016-05-01T10:00:00Z","PersistedAt":"2016-05-01T10:00:01Z","Payload":{}}"#,
                "\n",
            ),
        )?;

        let events = FlatFileEventStore::new(&path, clock()).load("id")?;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "test.run");
        assert_eq!(events[0].occurred_on, Some(clock().0));
        assert_eq!(events[0].payload["param"], "value");
        Ok(())
    }

    #[test]
    fn handlers_may_store_while_replaying() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let event_store = FlatFileEventStore::new(dir.path().join("events.json"), clock());
        event_store.store(&mut history())?;

        event_store.replay("other", &mut |event: &Event| {
            let mut copy = vec![event.clone().for_stream("copy")];
            event_store.store(&mut copy).unwrap();
        })?;

        assert_eq!(event_store.load("copy")?.len(), 1);
        Ok(())
    }
}
