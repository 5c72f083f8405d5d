//! A library for gathering scholarly search results and consolidating
//! overlapping entries into a single deduplicated report.
//!
//! `litmerge` queries several scholarly APIs for one topic, merges results
//! that describe the same work even when sources disagree on punctuation
//! or word order, and renders the outcome as a Markdown research report.
//!
//! # Key Features
//!
//! - **Bundled Sources**: Fetch candidates from:
//!   - arXiv (Atom export API)
//!   - CrossRef (REST works API)
//!   - OpenAlex
//!   - PubMed (NCBI E-utilities)
//!   - Google Scholar (via SerpAPI)
//!   - General web search (via the Ollama search API)
//!
//! - **Tolerant Retrieval**:
//!   - Sources are queried concurrently
//!   - A failed source contributes zero results instead of failing the run
//!   - Malformed entries are dropped with a log line, never an error
//!
//! - **Order-Stable Consolidation**:
//!   - Greedy title clustering against cluster representatives
//!   - Token-overlap gate plus string similarity, both configurable
//!   - The same input order always yields the same clusters
//!
//! # Basic Usage
//!
//! ```rust
//! use litmerge::{CandidateRecord, Consolidator};
//!
//! let mut from_arxiv = CandidateRecord::new("Attention Is All You Need", "arXiv");
//! from_arxiv.authors = vec!["Ashish Vaswani".to_string()];
//!
//! let mut from_crossref = CandidateRecord::new("Attention is all you need", "CrossRef");
//! from_crossref.url = Some("https://doi.org/10.5555/3295222".to_string());
//!
//! let consolidated = Consolidator::new().consolidate(&[from_arxiv, from_crossref]);
//! assert_eq!(consolidated.len(), 1);
//! assert_eq!(consolidated[0].member_sources, vec!["arXiv", "CrossRef"]);
//! ```
//!
//! # Tuning the Matcher
//!
//! ```rust
//! use litmerge::{SimilarityConfig, TitleScorer};
//!
//! let scorer = TitleScorer::new();
//! assert_eq!(
//!     scorer.score(
//!         "Adaptive Methods for Stochastic Optimization",
//!         "Adaptive  methods for stochastic optimization!",
//!     ),
//!     1.0
//! );
//!
//! // Stricter matching for short, generic titles.
//! let strict = TitleScorer::new().with_config(SimilarityConfig {
//!     match_threshold: 0.9,
//!     ..SimilarityConfig::default()
//! });
//! assert!(!strict.is_match(
//!     "Adaptive Methods for Stochastic Optimization",
//!     "Adaptive Methods for Stochastic Convex Optimization",
//! ));
//! ```
//!
//! # Rendering a Report
//!
//! ```rust
//! use litmerge::{CandidateRecord, Consolidator, ResearchSummary};
//! use litmerge::report::render_markdown;
//!
//! let candidates = vec![CandidateRecord::new("Graph Neural Networks", "arXiv")];
//! let summary = ResearchSummary {
//!     query: "graph neural networks".to_string(),
//!     source_counts: vec![("arXiv".to_string(), 1)],
//!     records: Consolidator::new().consolidate(&candidates),
//! };
//!
//! let report = render_markdown(&summary, "2025-03-01 12:00:00");
//! assert!(report.contains("# Research Report: graph neural networks"));
//! ```
//!
//! # Fetching from Live Sources
//!
//! The `fetch` feature (enabled by default) adds the [`sources`] adapter
//! implementations and the [`orchestrator`] module, which fans one query
//! out across an injected collection of adapters and consolidates
//! whatever comes back. The `cli` feature builds the `litmerge` binary on
//! top of that.
//!
//! # Thread Safety
//!
//! [`TitleScorer`] and [`Consolidator`] are cheap to clone and safe to
//! share between threads. Source adapters are required to be
//! `Send + Sync` so the orchestrator can drive them concurrently.

pub mod consolidate;
#[cfg(feature = "fetch")]
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod similarity;
#[cfg(feature = "fetch")]
pub mod sources;

// Reexports
pub use consolidate::Consolidator;
pub use record::{CandidateRecord, ConsolidatedRecord, MalformedCandidate};
pub use report::ResearchSummary;
pub use similarity::{SimilarityConfig, TitleScorer};
#[cfg(feature = "fetch")]
pub use sources::{SourceAdapter, SourceError};
