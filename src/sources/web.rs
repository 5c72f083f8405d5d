//! General web search adapter backed by the Ollama search API.
//!
//! This is the only bundled source that covers non-scholarly material.
//! Requests carry a bearer token; the CLI skips this source when no key
//! is configured.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SOURCE_NAME: &str = "Web";
const DEFAULT_BASE_URL: &str = "https://ollama.com";

/// Searches the open web through the Ollama web search API.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WebSearch {
    #[must_use]
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for WebSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        let url = format!("{}/api/web_search", self.base_url);
        tracing::trace!(%query, limit, "querying web search");
        let body = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&WebSearchRequest {
                query,
                max_results: limit,
            })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_web_results(&body)
    }
}

#[derive(Debug, Serialize)]
struct WebSearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    snippet: Option<String>,
}

fn parse_web_results(body: &str) -> SourceResult<Vec<CandidateRecord>> {
    let payload: WebSearchResponse = serde_json::from_str(body)?;

    let mut records = Vec::new();
    for item in payload.results {
        let Some(title) = item.title.filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        let mut record = CandidateRecord::new(title, SOURCE_NAME);
        record.abstract_text = item
            .content
            .or(item.snippet)
            .filter(|text| !text.trim().is_empty());
        record.url = item.url;
        records.push(record);
    }

    Ok(records)
}
