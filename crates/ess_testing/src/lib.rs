//! Testing utilities for [ess](https://docs.rs/ess) apps and event stores.
//!
//! # Examples
//!
//! Run the shared event store scenarios against a store implementation.
//!
//! ```
//! use ess::InMemoryEventStore;
//! use ess_testing::contract::test_stream_isolation;
//!
//! test_stream_isolation(InMemoryEventStore::new).unwrap();
//! ```
//!
//! Or stamp all of them out as `#[test]` functions:
//!
//! ```ignore
//! ess_testing::event_store_contract_tests! {
//!     suite = in_memory,
//!     make_store = ess::InMemoryEventStore::new,
//! }
//! ```

pub mod contract;

pub use ess::tests_cfg::{test_command, TestAggregate};
