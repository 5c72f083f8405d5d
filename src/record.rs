//! Core record types shared by the source adapters and the consolidation
//! engine.
//!
//! A [`CandidateRecord`] is one search result as reported by one source,
//! normalized into a common shape. Adapters produce candidates, the engine
//! reads them, nothing mutates them in between. A [`ConsolidatedRecord`] is
//! the merged view of one cluster of candidates that describe the same work.
//!
//! # Examples
//!
//! ```rust
//! use litmerge::record::CandidateRecord;
//!
//! let record = CandidateRecord::new("Attention Is All You Need", "arXiv");
//! assert!(record.validate().is_ok());
//!
//! let missing = CandidateRecord {
//!     title: String::new(),
//!     ..record
//! };
//! assert!(missing.validate().is_err());
//! ```

use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons a candidate is rejected at the ingestion boundary.
///
/// Malformed candidates are logged and dropped, never propagated as a
/// failure of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedCandidate {
    #[error("missing title")]
    MissingTitle,

    #[error("missing source")]
    MissingSource,
}

/// A single result from a single source.
///
/// The `title` is the only field the matching stage looks at. Everything
/// else is carried through to the merged output or the rendered report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Short random identifier, used in logs only
    pub id: String,
    /// Title of the work; the matching key
    pub title: String,
    /// Author names in the order the source reported them
    pub authors: Vec<String>,
    /// Abstract or snippet text
    pub abstract_text: Option<String>,
    /// Landing page or full-text URL
    pub url: Option<String>,
    /// Name of the adapter that produced this record
    pub source: String,
    /// Source-specific extras (DOI, year, ...), never used for matching
    pub raw_metadata: BTreeMap<String, String>,
}

impl CandidateRecord {
    /// Creates a record with a fresh id and the two required fields set.
    ///
    /// Remaining fields start empty and are filled in by the adapter.
    #[must_use]
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: nanoid!(),
            title: title.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Checks the required-field invariants.
    ///
    /// A record with a blank title or source is malformed and must be
    /// excluded from clustering.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedCandidate`] naming the first missing field.
    pub fn validate(&self) -> Result<(), MalformedCandidate> {
        if self.title.trim().is_empty() {
            return Err(MalformedCandidate::MissingTitle);
        }
        if self.source.trim().is_empty() {
            return Err(MalformedCandidate::MissingSource);
        }
        Ok(())
    }
}

/// One cluster of candidates that describe the same underlying work.
///
/// Produced by [`crate::consolidate::Consolidator::consolidate`]. Field
/// contents are deterministic for a fixed input order: every list keeps
/// first-seen order across the cluster's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    /// 1-based identifier in cluster creation order
    pub cluster_id: usize,
    /// Title of the cluster's first-inserted member
    pub representative_title: String,
    /// Distinct source names, first-seen order
    pub member_sources: Vec<String>,
    /// Author names de-duplicated case-insensitively, first-seen order
    pub merged_authors: Vec<String>,
    /// Longest non-empty abstract among the members
    pub merged_abstract: Option<String>,
    /// Distinct URLs, first-seen order
    pub urls: Vec<String>,
}
