//! The pluggable search capability.

use async_trait::async_trait;

use super::SearchItem;
use crate::errors::SearchError;

/// A search capability consumed by the research stage's prompt builder.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs one query, returning up to `max_results` hits in ranking order.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchItem>, SearchError>;
}

/// The context string substituted when search is unavailable.
#[must_use]
pub fn fallback_context(topic: &str) -> String {
    format!("External search is unavailable; analyze from model knowledge only: {topic}")
}
