//! Title similarity scoring for candidate records.
//!
//! A module for deciding whether two results returned by different sources
//! describe the same work. Matching is a pure function of the two titles,
//! with no network access and no source-specific logic.
//!
//! ## Matching Criteria
//!
//! Two titles are compared in stages:
//!
//! 1. Both titles are normalized: lower-cased, punctuation mapped to spaces,
//!    whitespace collapsed.
//! 2. Identical normalized titles score 1.0; a blank normalized title scores
//!    0.0 against everything.
//! 3. Token overlap (Jaccard index over the distinct-token sets) below the
//!    configured floor (default 0.6) scores 0.0. The overlap gate is hard,
//!    so short generic titles that merely share common words never reach the
//!    edit-distance stage.
//! 4. Otherwise the score is the normalized Levenshtein similarity between
//!    the two alphabetically token-sorted titles. Sorting makes the ratio
//!    insensitive to word order, so "Financial Decision Making and Cognitive
//!    Agency" and "Cognitive Agency and Financial Decision-Making" score 1.0.
//!
//! Two records are considered the same work when the score reaches the
//! match threshold (default 0.8).
//!
//! ## Usage
//!
//! ```rust
//! use litmerge::similarity::TitleScorer;
//!
//! let scorer = TitleScorer::new();
//!
//! // Case and punctuation differences are ignored.
//! let score = scorer.score(
//!     "Deep Learning for Climate Modeling",
//!     "Deep learning for climate modeling.",
//! );
//! assert_eq!(score, 1.0);
//!
//! // Sharing a couple of common words is not enough.
//! assert!(!scorer.is_match(
//!     "Deep Learning for Climate Modeling",
//!     "Climate Modeling Overview",
//! ));
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;
const DEFAULT_TOKEN_OVERLAP_THRESHOLD: f64 = 0.6;
const DEFAULT_MIN_TITLE_TOKENS: usize = 2;

/// Tunable thresholds for title matching.
///
/// The defaults are deliberately conservative. Loosening them merges more
/// aggressively; a false merge hides a distinct work from the report, while
/// a missed merge merely lists it twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Minimum score for two titles to be treated as the same work.
    /// Defaults to 0.8.
    pub match_threshold: f64,
    /// Minimum Jaccard token overlap before the string-similarity stage
    /// runs at all. Defaults to 0.6.
    pub token_overlap_threshold: f64,
    /// Titles with fewer tokens than this are never merged with anything.
    /// Defaults to 2.
    pub min_title_tokens: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            token_overlap_threshold: DEFAULT_TOKEN_OVERLAP_THRESHOLD,
            min_title_tokens: DEFAULT_MIN_TITLE_TOKENS,
        }
    }
}

/// A title preprocessed for repeated comparison.
///
/// Normalization and token sorting happen once here, so a candidate compared
/// against many cluster representatives does not redo them per pair.
#[derive(Debug, Clone)]
pub struct NormalizedTitle {
    normalized: String,
    token_sorted: String,
    tokens: BTreeSet<String>,
    token_count: usize,
}

impl NormalizedTitle {
    #[must_use]
    pub fn new(title: &str) -> Self {
        let normalized = normalize_title(title);
        let token_count = normalized.split_whitespace().count();
        let token_sorted = normalized.split_whitespace().sorted_unstable().join(" ");
        let tokens = normalized
            .split_whitespace()
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();
        Self {
            normalized,
            token_sorted,
            tokens,
            token_count,
        }
    }

    /// The normalized form of the original title.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Number of whitespace-separated tokens, duplicates included.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }
}

/// Title comparison engine holding the configured thresholds.
///
/// # Examples
///
/// ```rust
/// use litmerge::similarity::{SimilarityConfig, TitleScorer};
///
/// let strict = TitleScorer::new().with_config(SimilarityConfig {
///     match_threshold: 0.95,
///     ..Default::default()
/// });
/// ```
#[derive(Debug, Default, Clone)]
pub struct TitleScorer {
    config: SimilarityConfig,
}

impl TitleScorer {
    /// Creates a scorer with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SimilarityConfig::default(),
        }
    }

    /// Creates a scorer with custom thresholds.
    #[must_use]
    pub fn with_config(mut self, config: SimilarityConfig) -> Self {
        self.config = config;
        self
    }

    /// The thresholds this scorer applies.
    #[must_use]
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Scores two raw titles in `[0, 1]`.
    ///
    /// The score is symmetric, and reflexive for every title that does not
    /// normalize to the empty string.
    #[must_use]
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.score_normalized(&NormalizedTitle::new(a), &NormalizedTitle::new(b))
    }

    /// Scores two preprocessed titles in `[0, 1]`.
    #[must_use]
    pub fn score_normalized(&self, a: &NormalizedTitle, b: &NormalizedTitle) -> f64 {
        if a.normalized.is_empty() || b.normalized.is_empty() {
            return 0.0;
        }
        if a.normalized == b.normalized {
            return 1.0;
        }
        if token_overlap(a, b) < self.config.token_overlap_threshold {
            return 0.0;
        }
        normalized_levenshtein(&a.token_sorted, &b.token_sorted)
    }

    /// Whether two raw titles describe the same work under the configured
    /// thresholds.
    #[must_use]
    pub fn is_match(&self, a: &str, b: &str) -> bool {
        self.score(a, b) >= self.config.match_threshold
    }

    /// Whether two preprocessed titles describe the same work.
    #[must_use]
    pub fn is_match_normalized(&self, a: &NormalizedTitle, b: &NormalizedTitle) -> bool {
        self.score_normalized(a, b) >= self.config.match_threshold
    }

    /// Whether a title is long enough to take part in merging at all.
    #[must_use]
    pub fn meets_min_tokens(&self, title: &NormalizedTitle) -> bool {
        title.token_count >= self.config.min_title_tokens
    }
}

/// Normalizes a title for comparison.
///
/// Lower-cases, maps every non-alphanumeric character to a space and
/// collapses whitespace runs. Mapping punctuation to spaces rather than
/// deleting it keeps hyphenated words tokenizing like their spaced forms,
/// so "Decision-Making" and "Decision Making" produce the same tokens.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

/// Jaccard index over the distinct-token sets of two titles.
fn token_overlap(a: &NormalizedTitle, b: &NormalizedTitle) -> f64 {
    let union = a.tokens.union(&b.tokens).count();
    if union == 0 {
        return 0.0;
    }
    let shared = a.tokens.intersection(&b.tokens).count();
    shared as f64 / union as f64
}
