//! Web search tool
//!
//! Search is a capability picked at construction: either a live backend or
//! `Unavailable`, in which case the tool answers with an explicit message
//! instead of failing.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::tools::{required_str, ParameterProperty, ParameterSchema, Tool, ToolContext};

const MAX_RESULTS: usize = 5;

/// Text returned when no search backend is configured
pub const SEARCH_UNAVAILABLE: &str = "Error: search backend unavailable. Search unavailable.";

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// A web search backend
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize, ctx: &ToolContext) -> Result<Vec<SearchHit>>;
}

/// Search capability selected when the tool is built
#[derive(Clone)]
pub enum SearchProvider {
    Backend(Arc<dyn SearchBackend>),
    Unavailable,
}

impl SearchProvider {
    pub fn duckduckgo() -> Self {
        SearchProvider::Backend(Arc::new(DuckDuckGo::new()))
    }
}

/// DuckDuckGo HTML endpoint scraper
pub struct DuckDuckGo {
    client: reqwest::Client,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    async fn search(&self, query: &str, limit: usize, ctx: &ToolContext) -> Result<Vec<SearchHit>> {
        let search_url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        debug!("Sending search request to DuckDuckGo");
        let html = self
            .client
            .get(&search_url)
            .timeout(Duration::from_secs(ctx.http_timeout_secs))
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search returned error status")?
            .text()
            .await
            .context("Failed to read search response")?;

        parse_duckduckgo_results(&html, limit)
    }
}

/// Tool for searching the web
pub struct WebSearchTool {
    provider: SearchProvider,
}

impl WebSearchTool {
    pub fn new(provider: SearchProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_internet"
    }

    fn description(&self) -> &str {
        "Searches the web for information."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        ParameterSchema::new().with_required("query", ParameterProperty::string("The search query"))
    }

    fn failure_label(&self) -> &str {
        "Error during search"
    }

    #[instrument(skip(self, args, ctx), fields(query = tracing::field::Empty))]
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let query = required_str(args, "query")?;
        tracing::Span::current().record("query", query.chars().take(50).collect::<String>().as_str());

        let backend = match &self.provider {
            SearchProvider::Backend(backend) => backend,
            SearchProvider::Unavailable => {
                warn!("Search requested but no backend is configured");
                return Ok(SEARCH_UNAVAILABLE.to_string());
            }
        };

        let hits = backend.search(query, MAX_RESULTS, ctx).await?;
        debug!(results = hits.len(), "Search finished");

        Ok(serde_json::to_string_pretty(&hits)?)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

fn parse_duckduckgo_results(html: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result")?;
    let title_selector = selector(".result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();

    for result_el in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }

        let link = result_el.select(&title_selector).next();

        let title = link
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
            .trim()
            .to_string();

        let href = link
            .and_then(|el| el.value().attr("href"))
            .map(unwrap_redirect)
            .unwrap_or_default();

        let body = result_el
            .select(&snippet_selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
            .trim()
            .to_string();

        if !title.is_empty() && !href.is_empty() {
            results.push(SearchHit { title, href, body });
        }
    }

    Ok(results)
}

/// DuckDuckGo wraps target URLs in a redirect; pull the real one out
fn unwrap_redirect(href: &str) -> String {
    href.split("uddg=")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|s| s.into_owned())
        .unwrap_or_else(|| href.to_string())
}
