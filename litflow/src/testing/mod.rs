//! Deterministic test doubles for backends and search.
//!
//! Used by the crate's own tests and available to embedders for wiring
//! pipelines in their tests without touching a real process or network.

mod mocks;

pub use mocks::{
    FailingSearchProvider, MockBackend, RecordedCall, StaticSearchProvider,
};
