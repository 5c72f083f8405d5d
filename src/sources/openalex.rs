//! OpenAlex works adapter.
//!
//! OpenAlex returns abstracts as an inverted index of token positions
//! rather than plain text, so the abstract is rebuilt by expanding the
//! index and sorting tokens back into position order.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult};
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

const SOURCE_NAME: &str = "OpenAlex";
const DEFAULT_BASE_URL: &str = "https://api.openalex.org";

/// Searches scholarly works through the OpenAlex API.
#[derive(Debug, Clone)]
pub struct OpenAlexSearch {
    client: Client,
    base_url: String,
}

impl OpenAlexSearch {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
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
impl SourceAdapter for OpenAlexSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        let url = format!("{}/works", self.base_url);
        let per_page = limit.to_string();
        tracing::trace!(%query, limit, "querying OpenAlex");
        let body = self
            .client
            .get(&url)
            .query(&[("search", query), ("per-page", per_page.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_works(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<WorkResult>,
}

#[derive(Debug, Deserialize)]
struct WorkResult {
    id: Option<String>,
    title: Option<String>,
    doi: Option<String>,
    publication_year: Option<i64>,
    #[serde(default)]
    authorships: Vec<Authorship>,
    abstract_inverted_index: Option<BTreeMap<String, Vec<u32>>>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<AuthorInfo>,
}

#[derive(Debug, Deserialize)]
struct AuthorInfo {
    display_name: Option<String>,
}

fn parse_works(body: &str) -> SourceResult<Vec<CandidateRecord>> {
    let payload: WorksResponse = serde_json::from_str(body)?;

    let mut records = Vec::new();
    for work in payload.results {
        let Some(title) = work.title.filter(|t| !t.trim().is_empty()) else {
            continue;
        };

        let mut record = CandidateRecord::new(title, SOURCE_NAME);
        record.authors = work
            .authorships
            .iter()
            .filter_map(|entry| entry.author.as_ref()?.display_name.clone())
            .collect();
        if let Some(index) = &work.abstract_inverted_index {
            let text = reconstruct_abstract(index);
            if !text.is_empty() {
                record.abstract_text = Some(text);
            }
        }
        record.url = work.id;
        if let Some(doi) = work.doi {
            record.raw_metadata.insert("doi".to_string(), doi);
        }
        if let Some(year) = work.publication_year {
            record.raw_metadata.insert("year".to_string(), year.to_string());
        }
        records.push(record);
    }

    Ok(records)
}

/// Rebuilds abstract text from a `{token: [positions]}` inverted index.
fn reconstruct_abstract(index: &BTreeMap<String, Vec<u32>>) -> String {
    let mut positions: Vec<(u32, &str)> = Vec::new();
    for (token, offsets) in index {
        for &offset in offsets {
            positions.push((offset, token));
        }
    }
    positions.sort_unstable();
    positions.iter().map(|(_, token)| *token).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_WORKS: &str = r#"{
  "results": [
    {
      "id": "https://openalex.org/W2741809807",
      "title": "The State of OA",
      "doi": "https://doi.org/10.7717/peerj.4375",
      "publication_year": 2018,
      "authorships": [
        {"author": {"display_name": "Heather Piwowar"}},
        {"author": {"display_name": "Jason Priem"}},
        {"author": null}
      ],
      "abstract_inverted_index": {
        "the": [0, 4],
        "cat": [1],
        "sat": [2],
        "on": [3],
        "mat": [5]
      }
    },
    {
      "id": "https://openalex.org/W0000000000",
      "title": null
    },
    {
      "id": "https://openalex.org/W1111111111",
      "title": "Work Without Extras"
    }
  ]
}"#;

    #[test]
    fn test_parse_works() {
        let records = parse_works(SAMPLE_WORKS).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "The State of OA");
        assert_eq!(first.source, "OpenAlex");
        assert_eq!(first.authors, vec!["Heather Piwowar", "Jason Priem"]);
        assert_eq!(first.abstract_text.as_deref(), Some("the cat sat on the mat"));
        assert_eq!(first.url.as_deref(), Some("https://openalex.org/W2741809807"));
        assert_eq!(
            first.raw_metadata.get("doi").map(String::as_str),
            Some("https://doi.org/10.7717/peerj.4375")
        );
        assert_eq!(first.raw_metadata.get("year").map(String::as_str), Some("2018"));
    }

    #[test]
    fn test_parse_works_skips_untitled_and_tolerates_sparse_fields() {
        let records = parse_works(SAMPLE_WORKS).unwrap();
        let sparse = &records[1];
        assert_eq!(sparse.title, "Work Without Extras");
        assert_eq!(sparse.authors, Vec::<String>::new());
        assert_eq!(sparse.abstract_text, None);
        assert_eq!(sparse.raw_metadata.get("year"), None);
    }

    #[test]
    fn test_reconstruct_abstract_orders_repeated_tokens() {
        let mut index = BTreeMap::new();
        index.insert("learning".to_string(), vec![1, 3]);
        index.insert("deep".to_string(), vec![0]);
        index.insert("transfers".to_string(), vec![2]);
        assert_eq!(reconstruct_abstract(&index), "deep learning transfers learning");
    }

    #[test]
    fn test_parse_works_empty_results() {
        assert_eq!(parse_works(r#"{"results": []}"#).unwrap(), Vec::new());
        assert_eq!(parse_works("{}").unwrap(), Vec::new());
    }

    #[tokio::test]
    #[ignore = "hits the live OpenAlex API"]
    async fn test_live_openalex_search() {
        let client = crate::sources::http_client(crate::sources::DEFAULT_TIMEOUT).unwrap();
        let records = OpenAlexSearch::new(client)
            .fetch("open access", 3)
            .await
            .unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.source == "OpenAlex"));
    }
}
