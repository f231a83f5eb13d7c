//! DuckDuckGo HTML search provider.
//!
//! Scrapes the `html.duckduckgo.com` results page; there is no official
//! JSON API. Selectors follow the stable `result__*` class names.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use super::{SearchItem, SearchProvider};
use crate::errors::SearchError;

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const USER_AGENT: &str = concat!("litflow/", env!("CARGO_PKG_VERSION"));

/// Search provider backed by the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl DuckDuckGoProvider {
    /// Creates a provider sharing an existing HTTP client pool.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint base URL (testing).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchItem>, SearchError> {
        let url = format!("{}/html/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status { status: status.as_u16() });
        }

        let html = response.text().await?;
        let items = parse_results(&html, max_results);
        debug!(query, count = items.len(), "search returned results");
        Ok(items)
    }
}

/// Extracts ranked results from a DuckDuckGo HTML page.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchItem> {
    let result_sel = Selector::parse("div.result").expect("static selector");
    let title_sel = Selector::parse("a.result__a").expect("static selector");
    let snippet_sel = Selector::parse("a.result__snippet").expect("static selector");

    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for result in document.select(&result_sel) {
        if items.len() >= max_results {
            break;
        }
        let Some(anchor) = result.select(&title_sel).next() else { continue };
        let Some(href) = anchor.value().attr("href") else { continue };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        let mut item = SearchItem::new(title, href.to_string());
        if let Some(snippet) = snippet {
            item = item.with_snippet(snippet);
        }
        items.push(item);
    }

    items
}
