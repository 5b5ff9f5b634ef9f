use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum Error {
    /// An IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Unable to serialize event.
    #[error("serialize event error: {0}")]
    SerializeEvent(serde_json::Error),
    /// A line of the log is not a valid event.
    #[error("deserialize event error on line {line}: {source}")]
    DeserializeEvent {
        /// One-based line number in the log file.
        line: usize,
        /// Underlying decoding error.
        source: serde_json::Error,
    },
}

impl From<Error> for ess::Error {
    fn from(err: Error) -> Self {
        ess::Error::store(err)
    }
}
