//! Google Scholar adapter backed by SerpAPI.
//!
//! SerpAPI requires an API key; the CLI skips this source entirely when
//! none is configured. Scholar results carry no structured author list,
//! so records from this source have an empty `authors` field.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult, unescape_entities};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SOURCE_NAME: &str = "GoogleScholar";
const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Searches Google Scholar through the SerpAPI proxy.
#[derive(Debug, Clone)]
pub struct ScholarSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ScholarSearch {
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
impl SourceAdapter for ScholarSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        let url = format!("{}/search", self.base_url);
        let num = limit.to_string();
        tracing::trace!(%query, limit, "querying Google Scholar");
        let body = self
            .client
            .get(&url)
            .query(&[
                ("engine", "google_scholar"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_organic_results(&body, limit)
    }
}

#[derive(Debug, Deserialize)]
struct ScholarResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

fn parse_organic_results(body: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
    let payload: ScholarResponse = serde_json::from_str(body)?;

    let mut records = Vec::new();
    for item in payload.organic_results.into_iter().take(limit) {
        let Some(title) = item.title.as_deref().map(unescape_entities) else {
            continue;
        };
        if title.trim().is_empty() {
            continue;
        }

        let mut record = CandidateRecord::new(title, SOURCE_NAME);
        record.abstract_text = item
            .snippet
            .as_deref()
            .map(unescape_entities)
            .filter(|snippet| !snippet.trim().is_empty());
        record.url = item.link;
        records.push(record);
    }

    Ok(records)
}
