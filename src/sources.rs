//! Source adapter contracts and shared HTTP plumbing.
//!
//! Each scholarly source is an implementation of [`SourceAdapter`]. The
//! orchestrator treats adapters uniformly: ask each for up to `limit`
//! results, tag every record with the adapter's name, and translate a
//! failed source into zero results rather than a failed run. Adapters are
//! handed to the orchestrator as an explicit ordered collection; there is
//! no global registry.
//!
//! All bundled adapters separate the HTTP call from a pure parsing
//! function over the response body, so payload handling is tested offline
//! against fixture payloads.

use crate::record::CandidateRecord;
use async_trait::async_trait;
use quick_xml::events::attributes::AttrError;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

pub mod arxiv;
pub mod crossref;
pub mod openalex;
pub mod pubmed;
pub mod scholar;
pub mod web;

pub use arxiv::ArxivSearch;
pub use crossref::CrossrefSearch;
pub use openalex::OpenAlexSearch;
pub use pubmed::PubmedSearch;
pub use scholar::ScholarSearch;
pub use web::WebSearch;

/// Default per-request timeout for the bundled adapters.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("litmerge/", env!("CARGO_PKG_VERSION"));

/// A specialized Result type for adapter operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Errors surfaced by source adapters.
///
/// Any of these marks the whole source unavailable for the current run.
/// The orchestrator logs the error and continues with the other sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML payload error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] AttrError),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// A pluggable scholarly source.
///
/// Implementations own their endpoint specifics and produce
/// [`CandidateRecord`]s tagged with their [`name`](SourceAdapter::name).
/// All implementations must be `Send + Sync` so the orchestrator can query
/// them concurrently.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name, used as the `source` tag on every produced record.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` results for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the payload cannot
    /// be decoded.
    async fn fetch(&self, query: &str, limit: usize) -> SourceResult<Vec<CandidateRecord>>;
}

/// Builds the HTTP client shared by the bundled adapters.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the client cannot be constructed.
pub fn http_client(timeout: Duration) -> SourceResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Decodes character entities that sources embed in JSON string fields.
///
/// Falls back to the raw value when it is not valid entity syntax, so a
/// stray ampersand never discards a record.
pub(crate) fn unescape_entities(value: &str) -> String {
    quick_xml::escape::unescape(value).map_or_else(|_| value.to_string(), Cow::into_owned)
}

/// Accumulates text events until the named closing tag is reached.
///
/// Nested elements are skipped but their text is kept, so inline markup
/// such as `<i>` inside a title does not truncate the value.
pub(crate) fn extract_text(
    reader: &mut quick_xml::Reader<&[u8]>,
    buf: &mut Vec<u8>,
    closing_tag: &[u8],
) -> SourceResult<String> {
    use quick_xml::events::Event;
    use quick_xml::name::QName;

    let mut text = String::new();

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Text(e)) => {
                let chunk = e.unescape()?;
                if !text.is_empty() && !chunk.is_empty() {
                    text.push(' ');
                }
                text.push_str(&chunk);
            }
            Ok(Event::End(e)) if e.name() == QName(closing_tag) => break,
            Ok(Event::Eof) => {
                return Err(SourceError::Payload(format!(
                    "unexpected EOF while looking for closing tag '{}'",
                    String::from_utf8_lossy(closing_tag)
                )));
            }
            Err(e) => return Err(e.into()),
            _ => continue,
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}
