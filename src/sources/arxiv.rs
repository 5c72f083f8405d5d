//! arXiv Atom feed adapter.
//!
//! Queries the public arXiv export API and walks the returned Atom feed
//! with a streaming reader. The feed hard-wraps long titles and summaries,
//! so both are re-flowed onto a single line.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult, extract_text};
use async_trait::async_trait;
use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use reqwest::Client;

const SOURCE_NAME: &str = "arXiv";
const DEFAULT_BASE_URL: &str = "http://export.arxiv.org";

/// Searches arXiv preprints through the export API.
#[derive(Debug, Clone)]
pub struct ArxivSearch {
    client: Client,
    base_url: String,
}

impl ArxivSearch {
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
impl SourceAdapter for ArxivSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        let url = format!("{}/api/query", self.base_url);
        let search_query = format!("all:{query}");
        let max_results = limit.to_string();
        tracing::trace!(%query, limit, "querying arXiv");
        let body = self
            .client
            .get(&url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_atom_feed(&body)
    }
}

fn parse_atom_feed(content: &str) -> SourceResult<Vec<CandidateRecord>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name() == QName(b"entry") => {
                if let Some(record) = parse_entry(&mut reader, &mut buf)? {
                    records.push(record);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => (),
        }
        buf.clear();
    }

    Ok(records)
}

/// Parses one `<entry>` element into a candidate record.
///
/// Returns `None` for entries without a usable title.
fn parse_entry(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> SourceResult<Option<CandidateRecord>> {
    let mut title = String::new();
    let mut summary = String::new();
    let mut published = String::new();
    let mut entry_url = String::new();
    let mut pdf_url: Option<String> = None;
    let mut authors = Vec::new();
    let mut in_author = false;

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"title" => title = extract_text(reader, buf, b"title")?,
                b"summary" => summary = extract_text(reader, buf, b"summary")?,
                b"published" => published = extract_text(reader, buf, b"published")?,
                b"id" => entry_url = extract_text(reader, buf, b"id")?,
                b"author" => in_author = true,
                b"name" if in_author => {
                    let name = extract_text(reader, buf, b"name")?;
                    if !name.is_empty() {
                        authors.push(name);
                    }
                }
                b"link" => {
                    if pdf_url.is_none() {
                        pdf_url = pdf_href(e)?;
                    }
                }
                _ => (),
            },
            Ok(Event::Empty(ref e)) if e.name() == QName(b"link") => {
                if pdf_url.is_none() {
                    pdf_url = pdf_href(e)?;
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"author" => in_author = false,
                b"entry" => break,
                _ => (),
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => (),
        }
        buf.clear();
    }

    if title.trim().is_empty() {
        return Ok(None);
    }

    let mut record = CandidateRecord::new(reflow(&title), SOURCE_NAME);
    record.authors = authors;
    if !summary.is_empty() {
        record.abstract_text = Some(reflow(&summary));
    }
    record.url = pdf_url.or_else(|| (!entry_url.is_empty()).then_some(entry_url));
    if let Some(date) = published.get(..10) {
        record
            .raw_metadata
            .insert("published".to_string(), date.to_string());
    }

    Ok(Some(record))
}

fn pdf_href(e: &BytesStart) -> SourceResult<Option<String>> {
    let mut href = None;
    let mut is_pdf = false;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"href" => href = Some(attr.unescape_value()?.into_owned()),
            b"type" if attr.value.as_ref() == b"application/pdf" => is_pdf = true,
            _ => (),
        }
    }
    Ok(if is_pdf { href } else { None })
}

fn reflow(text: &str) -> String {
    text.split_whitespace().join(" ")
}
