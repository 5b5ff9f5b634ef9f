//! A file backed implementation of [EventStore](ess::EventStore).
//!
//! Events are appended to a single file, one JSON object per line. Every
//! replay reads the whole file from the beginning.

#![deny(missing_docs)]

pub use error::Error;
pub use event_store::FlatFileEventStore;

mod error;
mod event_store;
