//! Web search collaborator for the research stage.
//!
//! The pipeline consumes search through the [`SearchProvider`] trait only;
//! provider failures degrade to a fallback context string inside the
//! research prompt builder and never abort a run.

mod models;
mod provider;

#[cfg(feature = "websearch")]
mod duckduckgo;

pub use models::SearchItem;
pub use provider::{fallback_context, SearchProvider};

#[cfg(feature = "websearch")]
pub use duckduckgo::DuckDuckGoProvider;
