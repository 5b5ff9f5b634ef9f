use thiserror::Error;
use tracing::{metadata::LevelFilter, Level};

use crate::ValidationError;

/// Type alias for `Result<T, ess::Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Represents all the ways processing a command or touching a store can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Command parameters or business rules were violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The command's definition never registered a receiver factory.
    #[error("command '{0}' has no target")]
    MissingTarget(String),
    /// A command is delivered to its receiver at most once.
    #[error("command '{0}' already executed")]
    AlreadyExecuted(String),
    /// Read write lock error.
    #[error("could not get read/write lock")]
    RwPoison,
    /// Opaque failure reported by an event store backend.
    #[error("event store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a backend specific error.
    ///
    /// Returns the [Error::Store] variant.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Store(err.into())
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Recommended log level for the current error.
    pub fn level(&self) -> LevelFilter {
        use Error::*;

        match self {
            Validation(_) => LevelFilter::WARN,
            MissingTarget(_) => LevelFilter::ERROR,
            AlreadyExecuted(_) => LevelFilter::WARN,
            RwPoison => LevelFilter::ERROR,
            Store(_) => LevelFilter::ERROR,
        }
    }

    /// Log the error based on the recommended level.
    pub fn log(&self) {
        use tracing::{debug, error, info, trace, warn};

        let level = self.level();
        if level == Level::ERROR {
            error!("DENY {self}");
        } else if level == Level::WARN {
            warn!("DENY {self}");
        } else if level == Level::INFO {
            info!("DENY {self}");
        } else if level == Level::DEBUG {
            debug!("DENY {self}");
        } else if level == Level::TRACE {
            trace!("DENY {self}");
        }
    }
}
