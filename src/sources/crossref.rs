//! CrossRef works adapter.
//!
//! Searches the CrossRef REST API by title relevance. Abstracts come back
//! as JATS fragments, so markup is stripped before the text is stored.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult, unescape_entities};
use async_trait::async_trait;
use itertools::Itertools;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;

const SOURCE_NAME: &str = "CrossRef";
const DEFAULT_BASE_URL: &str = "https://api.crossref.org";

static MARKUP_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Searches published works through the CrossRef REST API.
#[derive(Debug, Clone)]
pub struct CrossrefSearch {
    client: Client,
    base_url: String,
}

impl CrossrefSearch {
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
impl SourceAdapter for CrossrefSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        let url = format!("{}/works", self.base_url);
        let rows = limit.to_string();
        tracing::trace!(%query, limit, "querying CrossRef");
        let body = self
            .client
            .get(&url)
            .query(&[
                ("query.title", query),
                ("rows", rows.as_str()),
                ("sort", "relevance"),
            ])
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
    message: WorksMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "published-print")]
    published_print: Option<WorkDate>,
    #[serde(rename = "published-online")]
    published_online: Option<WorkDate>,
}

impl WorkItem {
    /// Publication year, preferring the print date over the online one.
    fn year(&self) -> Option<i64> {
        [&self.published_print, &self.published_online]
            .into_iter()
            .flatten()
            .find_map(WorkDate::year)
    }
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl WorkDate {
    fn year(&self) -> Option<i64> {
        self.date_parts.first().and_then(|parts| parts.first()).copied().flatten()
    }
}

fn parse_works(body: &str) -> SourceResult<Vec<CandidateRecord>> {
    let payload: WorksResponse = serde_json::from_str(body)?;

    let mut records = Vec::new();
    for item in payload.message.items {
        let Some(title) = item.title.first() else {
            continue;
        };
        let title = unescape_entities(title);
        if title.trim().is_empty() {
            continue;
        }

        let mut record = CandidateRecord::new(title, SOURCE_NAME);
        record.authors = item.author.iter().filter_map(author_name).collect();
        if let Some(text) = &item.abstract_text {
            let cleaned = MARKUP_TAGS.replace_all(text, "").trim().to_string();
            if !cleaned.is_empty() {
                record.abstract_text = Some(cleaned);
            }
        }
        if let Some(year) = item.year() {
            record.raw_metadata.insert("year".to_string(), year.to_string());
        }
        record.url = item.url;
        if let Some(doi) = item.doi {
            record.raw_metadata.insert("doi".to_string(), doi);
        }
        records.push(record);
    }

    Ok(records)
}

fn author_name(author: &WorkAuthor) -> Option<String> {
    let name = [author.given.as_deref(), author.family.as_deref()]
        .into_iter()
        .flatten()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_WORKS: &str = r#"{
  "status": "ok",
  "message": {
    "items": [
      {
        "title": ["Deep Residual Learning for Image Recognition"],
        "author": [
          {"given": "Kaiming", "family": "He"},
          {"given": "Xiangyu", "family": "Zhang"},
          {"family": "Ren"}
        ],
        "DOI": "10.1109/cvpr.2016.90",
        "URL": "https://doi.org/10.1109/cvpr.2016.90",
        "abstract": "<jats:p>Deeper neural networks are more difficult to train.</jats:p>",
        "published-print": {"date-parts": [[2016, 6]]}
      },
      {
        "title": ["Climate &amp; Society Interactions"],
        "published-online": {"date-parts": [[2021]]}
      },
      {
        "title": []
      },
      {
        "title": ["   "]
      }
    ]
  }
}"#;

    #[test]
    fn test_parse_works() {
        let records = parse_works(SAMPLE_WORKS).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Deep Residual Learning for Image Recognition");
        assert_eq!(first.source, "CrossRef");
        assert_eq!(first.authors, vec!["Kaiming He", "Xiangyu Zhang", "Ren"]);
        assert_eq!(
            first.abstract_text.as_deref(),
            Some("Deeper neural networks are more difficult to train.")
        );
        assert_eq!(first.url.as_deref(), Some("https://doi.org/10.1109/cvpr.2016.90"));
        assert_eq!(first.raw_metadata.get("doi").map(String::as_str), Some("10.1109/cvpr.2016.90"));
        assert_eq!(first.raw_metadata.get("year").map(String::as_str), Some("2016"));
    }

    #[test]
    fn test_parse_works_unescapes_titles_and_skips_blank_ones() {
        let records = parse_works(SAMPLE_WORKS).unwrap();
        let second = &records[1];
        assert_eq!(second.title, "Climate & Society Interactions");
        assert_eq!(second.authors, Vec::<String>::new());
        assert_eq!(second.abstract_text, None);
        assert_eq!(second.raw_metadata.get("year").map(String::as_str), Some("2021"));
    }

    #[test]
    fn test_parse_works_handles_missing_message() {
        let records = parse_works(r#"{"status": "ok"}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_works_rejects_invalid_json() {
        assert!(parse_works("not json").is_err());
    }

    #[test]
    fn test_parse_works_handles_null_date_parts() {
        let body = r#"{
  "message": {
    "items": [
      {"title": ["Untagged Work"], "published-print": {"date-parts": [[null]]}}
    ]
  }
}"#;
        let records = parse_works(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_metadata.get("year"), None);
    }

    #[tokio::test]
    #[ignore = "hits the live CrossRef API"]
    async fn test_live_crossref_search() {
        let client = crate::sources::http_client(crate::sources::DEFAULT_TIMEOUT).unwrap();
        let records = CrossrefSearch::new(client)
            .fetch("machine learning", 3)
            .await
            .unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.source == "CrossRef"));
    }
}
