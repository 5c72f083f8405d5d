//! PubMed E-utilities adapter.
//!
//! Runs the two-step NCBI flow: `esearch` for matching PMIDs, then
//! `efetch` for the article XML. NCBI asks API users to identify
//! themselves, so a contact e-mail can be attached to every request.

use crate::record::CandidateRecord;
use crate::sources::{SourceAdapter, SourceResult, extract_text};
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::QName;
use reqwest::Client;
use serde::Deserialize;

const SOURCE_NAME: &str = "PubMed";
const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov";

/// Searches biomedical literature through the NCBI E-utilities.
#[derive(Debug, Clone)]
pub struct PubmedSearch {
    client: Client,
    base_url: String,
    email: Option<String>,
}

impl PubmedSearch {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            email: None,
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Attaches a contact e-mail to every E-utilities request.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    async fn search_ids(&self, query: &str, limit: usize) -> SourceResult<Vec<String>> {
        let url = format!("{}/entrez/eutils/esearch.fcgi", self.base_url);
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", limit.to_string()),
            ("retmode", "json".to_string()),
        ];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        let body = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_esearch(&body)
    }
}

#[async_trait]
impl SourceAdapter for PubmedSearch {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>> {
        tracing::trace!(%query, limit, "querying PubMed");
        let ids = self.search_ids(query, limit).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/entrez/eutils/efetch.fcgi", self.base_url);
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
        ];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        let body = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_efetch_xml(&body)
    }
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

fn parse_esearch(body: &str) -> SourceResult<Vec<String>> {
    let payload: EsearchResponse = serde_json::from_str(body)?;
    Ok(payload.esearchresult.idlist)
}

fn parse_efetch_xml(content: &str) -> SourceResult<Vec<CandidateRecord>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name() == QName(b"PubmedArticle") => {
                if let Some(record) = parse_article(&mut reader, &mut buf)? {
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

/// Parses one `<PubmedArticle>` element.
///
/// Articles without a title or PMID are dropped rather than failing the
/// whole batch.
fn parse_article(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
) -> SourceResult<Option<CandidateRecord>> {
    let mut title = String::new();
    let mut abstract_parts: Vec<String> = Vec::new();
    let mut authors: Vec<String> = Vec::new();
    let mut doi: Option<String> = None;
    let mut pmid: Option<String> = None;

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PMID" => {
                    let value = extract_text(reader, buf, b"PMID")?;
                    if pmid.is_none() && !value.is_empty() {
                        pmid = Some(value);
                    }
                }
                b"ArticleTitle" => title = extract_text(reader, buf, b"ArticleTitle")?,
                b"AbstractText" => {
                    let text = extract_text(reader, buf, b"AbstractText")?;
                    if !text.is_empty() {
                        abstract_parts.push(text);
                    }
                }
                b"Author" => {
                    if let Some(name) = parse_author(reader, buf)? {
                        authors.push(name);
                    }
                }
                b"ArticleId" => {
                    let mut id_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"IdType" {
                            id_type = Some(attr.unescape_value()?.into_owned());
                        }
                    }
                    let value = extract_text(reader, buf, b"ArticleId")?;
                    if id_type.as_deref() == Some("doi") && doi.is_none() && !value.is_empty() {
                        doi = Some(value);
                    }
                }
                _ => (),
            },
            Ok(Event::End(ref e)) if e.name() == QName(b"PubmedArticle") => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => (),
        }
        buf.clear();
    }

    let Some(pmid) = pmid else {
        tracing::debug!("skipping PubMed article without a PMID");
        return Ok(None);
    };
    if title.trim().is_empty() {
        tracing::debug!(%pmid, "skipping PubMed article without a title");
        return Ok(None);
    }

    let mut record = CandidateRecord::new(title, SOURCE_NAME);
    record.authors = authors;
    if !abstract_parts.is_empty() {
        record.abstract_text = Some(abstract_parts.join(" "));
    }
    record.url = Some(format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"));
    record.raw_metadata.insert("pmid".to_string(), pmid);
    if let Some(doi) = doi {
        record.raw_metadata.insert("doi".to_string(), doi);
    }

    Ok(Some(record))
}

/// Reads an `<Author>` element, returning the full name only when both
/// fore name and last name are present.
fn parse_author(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> SourceResult<Option<String>> {
    let mut last_name = None;
    let mut fore_name = None;

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"LastName" => last_name = Some(extract_text(reader, buf, b"LastName")?),
                b"ForeName" => fore_name = Some(extract_text(reader, buf, b"ForeName")?),
                _ => (),
            },
            Ok(Event::End(ref e)) if e.name() == QName(b"Author") => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => (),
        }
        buf.clear();
    }

    Ok(match (fore_name, last_name) {
        (Some(fore), Some(last)) if !fore.is_empty() && !last.is_empty() => {
            Some(format!("{fore} {last}"))
        }
        _ => None,
    })
}
